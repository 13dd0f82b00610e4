//! Per-tick orchestration: advance time, keep the video playing, step the
//! hover animation, push dirty textures and issue the draw.

use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::composite::{Filter, ImageRef, ShaderUniforms};
use crate::error::VideoError;
use crate::raster::Raster;
use crate::session::Session;

#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn as_image(&self) -> Option<ImageRef<'a>> {
        ImageRef::new(self.width, self.height, self.pixels, Filter::Linear)
    }
}

pub trait VideoSource {
    fn name(&self) -> &str;
    fn is_playing(&self) -> bool;
    fn play(&mut self) -> Result<(), VideoError>;
    /// Advance to `elapsed` and return the frame if it changed since the last
    /// call.
    fn poll_frame(&mut self, elapsed: Duration) -> Option<FrameView<'_>>;
}

pub trait FrameSink {
    fn upload_video(&mut self, frame: FrameView<'_>) -> Result<()>;
    fn upload_ui(&mut self, raster: &Raster) -> Result<()>;
    fn draw(&mut self, uniforms: &ShaderUniforms) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub elapsed: f32,
    pub ui_redrawn: bool,
    pub video_playing: bool,
}

#[derive(Debug, Default)]
pub struct FrameDriver {
    frames: u64,
    resume_failures: u32,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick(
        &mut self,
        elapsed: Duration,
        session: &mut Session,
        video: &mut dyn VideoSource,
        sink: &mut dyn FrameSink,
    ) -> Result<FrameReport> {
        let seconds = elapsed.as_secs_f32();
        session.set_elapsed(seconds);

        if !video.is_playing() {
            self.try_resume(video);
        }
        if let Some(frame) = video.poll_frame(elapsed) {
            sink.upload_video(frame)?;
        }

        let ui_redrawn = session.advance_hover();
        if session.canvas().raster().is_dirty() {
            sink.upload_ui(session.canvas().raster())?;
            session.mark_ui_uploaded();
        }

        sink.draw(session.uniforms())?;
        self.frames += 1;

        let report = FrameReport {
            elapsed: seconds,
            ui_redrawn,
            video_playing: video.is_playing(),
        };
        debug!("frame {} {:?}", self.frames, report);
        Ok(report)
    }

    fn try_resume(&mut self, video: &mut dyn VideoSource) {
        match video.play() {
            Ok(()) => {
                if self.resume_failures > 0 {
                    info!(
                        "video '{}' started after {} attempts",
                        video.name(),
                        self.resume_failures
                    );
                }
                self.resume_failures = 0;
            }
            Err(err) => {
                if self.resume_failures == 0 {
                    warn!("{err}; retrying every frame");
                } else {
                    debug!("{err} (attempt {})", self.resume_failures + 1);
                }
                self.resume_failures += 1;
            }
        }
    }
}
