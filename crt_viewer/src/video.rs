//! Background video sources: a looping Ogg Theora stream, a still image, or
//! nothing at all.

mod yuv;

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crt_core::{FrameView, VideoError, VideoSource};
use log::{debug, info, warn};
use theorafile_rs::{
    OggTheora_File, tf_close, tf_eos, tf_fopen, tf_hasvideo, tf_readvideo, tf_videoinfo,
    th_pixel_fmt,
};

use self::yuv::{PlaneLayout, Subsampling};

const FALLBACK_FRAME_NS: f64 = 1_000_000_000.0 / 30.0;

/// Pick a source for `path` by extension. `None` yields a source that never
/// starts.
pub fn open_video(path: Option<&Path>) -> Box<dyn VideoSource> {
    let Some(path) = path else {
        return Box::new(NoVideo);
    };
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png" | "jpg" | "jpeg") => Box::new(StillImage::new(path.to_path_buf())),
        _ => Box::new(TheoraLoop::new(path.to_path_buf())),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct NoVideo;

impl VideoSource for NoVideo {
    fn name(&self) -> &str {
        "none"
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn play(&mut self) -> Result<(), VideoError> {
        Err(VideoError::Missing)
    }

    fn poll_frame(&mut self, _elapsed: Duration) -> Option<FrameView<'_>> {
        None
    }
}

/// A single decoded image shown as a paused frame.
pub struct StillImage {
    name: String,
    path: PathBuf,
    image: Option<(u32, u32, Vec<u8>)>,
    delivered: bool,
}

impl StillImage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            name: display_name(&path),
            path,
            image: None,
            delivered: false,
        }
    }
}

impl VideoSource for StillImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_playing(&self) -> bool {
        self.image.is_some()
    }

    fn play(&mut self) -> Result<(), VideoError> {
        if self.image.is_some() {
            return Ok(());
        }
        let decoded = image::open(&self.path).map_err(|err| VideoError::Start {
            name: self.name.clone(),
            reason: err.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        info!("loaded still background {} ({}x{})", self.name, rgba.width(), rgba.height());
        self.image = Some((rgba.width(), rgba.height(), rgba.into_raw()));
        self.delivered = false;
        Ok(())
    }

    fn poll_frame(&mut self, _elapsed: Duration) -> Option<FrameView<'_>> {
        if self.delivered {
            return None;
        }
        let (width, height, pixels) = self.image.as_ref()?;
        self.delivered = true;
        Some(FrameView {
            width: *width,
            height: *height,
            pixels,
        })
    }
}

/// Ogg Theora file played on a loop. The stream is reopened from the start
/// whenever it runs out.
pub struct TheoraLoop {
    name: String,
    path: PathBuf,
    stream: Option<TheoraStream>,
    loop_start: Option<Duration>,
    loops: u32,
}

impl TheoraLoop {
    pub fn new(path: PathBuf) -> Self {
        Self {
            name: display_name(&path),
            path,
            stream: None,
            loop_start: None,
            loops: 0,
        }
    }

    fn restart(&mut self, elapsed: Duration) -> Result<(), VideoError> {
        self.stream = None;
        self.stream = Some(TheoraStream::open(&self.name, &self.path)?);
        self.loop_start = Some(elapsed);
        self.loops += 1;
        debug!("video '{}' looped ({} times)", self.name, self.loops);
        Ok(())
    }

    fn advance(&mut self, elapsed: Duration) -> Result<bool, VideoError> {
        let start = *self.loop_start.get_or_insert(elapsed);
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };
        let target = stream.frame_index_at(elapsed.saturating_sub(start));
        match stream.seek_forward(target)? {
            Seek::Reached { advanced } => Ok(advanced),
            Seek::EndOfStream => {
                self.restart(elapsed)?;
                match self.stream.as_mut() {
                    Some(stream) => match stream.seek_forward(0)? {
                        Seek::Reached { advanced } => Ok(advanced),
                        Seek::EndOfStream => Ok(false),
                    },
                    None => Ok(false),
                }
            }
        }
    }
}

impl VideoSource for TheoraLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    fn play(&mut self) -> Result<(), VideoError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TheoraStream::open(&self.name, &self.path)?;
        info!(
            "playing {} ({}x{}, {})",
            self.name,
            stream.width,
            stream.height,
            match stream.layout.subsampling() {
                Subsampling::Yuv420 => "4:2:0",
                Subsampling::Yuv422 => "4:2:2",
                Subsampling::Yuv444 => "4:4:4",
            }
        );
        self.stream = Some(stream);
        self.loop_start = None;
        Ok(())
    }

    fn poll_frame(&mut self, elapsed: Duration) -> Option<FrameView<'_>> {
        match self.advance(elapsed) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                warn!("{err}; pausing until playback restarts");
                self.stream = None;
                return None;
            }
        }
        let stream = self.stream.as_ref()?;
        Some(FrameView {
            width: stream.width,
            height: stream.height,
            pixels: &stream.rgba,
        })
    }
}

enum Seek {
    Reached { advanced: bool },
    EndOfStream,
}

struct TheoraStream {
    name: String,
    file: OggTheora_File,
    width: u32,
    height: u32,
    frame_ns: f64,
    layout: PlaneLayout,
    yuv: Vec<u8>,
    rgba: Vec<u8>,
    cursor: Option<u64>,
}

impl TheoraStream {
    fn open(name: &str, path: &Path) -> Result<Self, VideoError> {
        let start_error = |reason: String| VideoError::Start {
            name: name.to_string(),
            reason,
        };
        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| start_error("path contains a NUL byte".into()))?;

        let mut file = MaybeUninit::<OggTheora_File>::zeroed();
        let rc = unsafe { tf_fopen(c_path.as_ptr(), file.as_mut_ptr()) };
        if rc != 0 {
            return Err(start_error(format!("could not open (error code {rc})")));
        }
        let mut file = unsafe { file.assume_init() };

        match Self::describe(&mut file) {
            Ok((width, height, fps, layout)) => {
                let (Some(yuv_len), Some(rgba_len)) = (layout.yuv_len(), layout.rgba_len()) else {
                    unsafe { tf_close(&mut file) };
                    return Err(start_error("frame buffers would overflow".into()));
                };
                Ok(Self {
                    name: name.to_string(),
                    file,
                    width,
                    height,
                    frame_ns: if fps > 0.0 {
                        1_000_000_000.0 / fps
                    } else {
                        FALLBACK_FRAME_NS
                    },
                    layout,
                    yuv: vec![0; yuv_len],
                    rgba: vec![0; rgba_len],
                    cursor: None,
                })
            }
            Err(reason) => {
                unsafe { tf_close(&mut file) };
                Err(start_error(reason))
            }
        }
    }

    fn describe(file: &mut OggTheora_File) -> Result<(u32, u32, f64, PlaneLayout), String> {
        if unsafe { tf_hasvideo(file) } == 0 {
            return Err("no video stream".into());
        }
        let mut width: i32 = 0;
        let mut height: i32 = 0;
        let mut fps: f64 = 0.0;
        let mut format: th_pixel_fmt = 0;
        unsafe {
            tf_videoinfo(
                file,
                &mut width as *mut i32,
                &mut height as *mut i32,
                &mut fps as *mut f64,
                &mut format as *mut th_pixel_fmt,
            );
        }
        let width = u32::try_from(width).map_err(|_| format!("invalid width {width}"))?;
        let height = u32::try_from(height).map_err(|_| format!("invalid height {height}"))?;
        if width == 0 || height == 0 {
            return Err(format!("empty frame size {width}x{height}"));
        }
        let subsampling = Subsampling::from_theora(format)
            .ok_or_else(|| format!("unsupported pixel format {format}"))?;
        Ok((
            width,
            height,
            fps,
            PlaneLayout::new(width as usize, height as usize, subsampling),
        ))
    }

    fn frame_index_at(&self, since_start: Duration) -> u64 {
        (since_start.as_nanos() as f64 / self.frame_ns).floor() as u64
    }

    /// Decode until the cursor reaches `target`.
    fn seek_forward(&mut self, target: u64) -> Result<Seek, VideoError> {
        let mut advanced = false;
        loop {
            if matches!(self.cursor, Some(current) if current >= target) {
                return Ok(Seek::Reached { advanced });
            }
            let rc = unsafe { tf_readvideo(&mut self.file, self.yuv.as_mut_ptr() as *mut c_char, 1) };
            match rc {
                1 => {
                    self.layout.convert(&self.yuv, &mut self.rgba);
                    self.cursor = Some(self.cursor.map_or(0, |value| value + 1));
                    advanced = true;
                }
                0 if unsafe { tf_eos(&mut self.file) } != 0 => {
                    if self.cursor.is_none() {
                        return Err(VideoError::Decode {
                            name: self.name.clone(),
                            reason: "end of stream before the first frame".into(),
                        });
                    }
                    return Ok(Seek::EndOfStream);
                }
                0 => match self.cursor {
                    Some(current) => self.cursor = Some(current + 1),
                    None => {
                        return Err(VideoError::Decode {
                            name: self.name.clone(),
                            reason: "duplicate frame before the first frame".into(),
                        });
                    }
                },
                other => {
                    return Err(VideoError::Decode {
                        name: self.name.clone(),
                        reason: format!("decoder returned status {other}"),
                    });
                }
            }
        }
    }
}

impl Drop for TheoraStream {
    fn drop(&mut self) {
        unsafe {
            tf_close(&mut self.file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn missing_source_never_plays() {
        let mut video = open_video(None);
        assert!(!video.is_playing());
        assert!(matches!(video.play(), Err(VideoError::Missing)));
        assert!(video.poll_frame(Duration::ZERO).is_none());
    }

    #[test]
    fn unreadable_theora_file_fails_to_start() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("absent.ogv");
        let mut video = open_video(Some(path.as_path()));
        assert!(matches!(video.play(), Err(VideoError::Start { .. })));
        assert!(!video.is_playing());
    }

    #[test]
    fn still_image_delivers_one_frame() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("bg.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write png");

        let mut video = open_video(Some(path.as_path()));
        assert!(!video.is_playing());
        video.play().expect("still image loads");
        assert!(video.is_playing());
        {
            let frame = video.poll_frame(Duration::ZERO).expect("first frame");
            assert_eq!((frame.width, frame.height), (3, 2));
            assert_eq!(&frame.pixels[..4], &[10, 20, 30, 255]);
        }
        assert!(video.poll_frame(Duration::from_secs(1)).is_none());
    }
}
