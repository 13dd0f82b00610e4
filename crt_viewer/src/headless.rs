//! Window-less rendering through the CPU compositor.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use crt_core::composite::{Filter, ImageRef, Solid, Texture};
use crt_core::{AppConfig, GlyphSource, Session, VideoSource, composite_frame};
use glam::Vec4;
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use log::{info, warn};

pub struct DumpRequest<'a> {
    pub destination: &'a Path,
    pub window: (u32, u32),
    pub elapsed: Duration,
}

/// Composite one frame at `request.elapsed` with the pointer idle and write
/// it to `request.destination`.
pub fn dump_render(
    config: AppConfig,
    font: Arc<dyn GlyphSource>,
    video: &mut dyn VideoSource,
    request: &DumpRequest<'_>,
) -> Result<()> {
    let (width, height) = request.window;
    let mut session = Session::new(config, font, request.window).context("building UI session")?;
    session.set_elapsed(request.elapsed.as_secs_f32());

    if let Err(err) = video.play() {
        warn!("{err}; rendering without video");
    }
    let frame = video.poll_frame(request.elapsed);
    let black = Solid(Vec4::new(0.0, 0.0, 0.0, 1.0));
    let video_image = frame.and_then(|frame| frame.as_image());
    let video_texture: &dyn Texture = match &video_image {
        Some(image) => image,
        None => &black,
    };

    let raster = session.canvas().raster();
    let ui = ImageRef::new(raster.width(), raster.height(), raster.pixels(), Filter::Nearest)
        .context("UI raster has no pixels")?;
    let pixels = composite_frame(video_texture, &ui, session.uniforms(), width, height);
    write_png(request.destination, width, height, &pixels)?;
    info!(
        "wrote {}x{} frame at t={:.2}s to {}",
        width,
        height,
        request.elapsed.as_secs_f32(),
        request.destination.display()
    );
    Ok(())
}

fn write_png(destination: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
    ensure!(
        data.len() == width as usize * height as usize * 4,
        "RGBA buffer size {} does not match dimensions {}x{}",
        data.len(),
        width,
        height
    );
    let file = File::create(destination)
        .with_context(|| format!("creating {}", destination.display()))?;
    PngEncoder::new(BufWriter::new(file))
        .write_image(data, width, height, ColorType::Rgba8.into())
        .with_context(|| format!("encoding PNG {}", destination.display()))?;
    Ok(())
}
