//! CPU reference for the CRT compositing pass. The WGSL shader in the viewer
//! performs the same per-pixel steps with the same constants; this version
//! backs headless rendering and lets the pipeline be tested without a GPU.

use glam::{Vec2, Vec3, Vec4};

use crate::config::ShaderConstants;
use crate::surface::SurfaceRect;
use crate::variant::LOGICAL_ASPECT;

pub const SCREEN_CORNER_RADIUS: f32 = 0.12;
pub const BLOOM_RADIUS: f32 = 0.005;
pub const BLOOM_TAPS: usize = 8;
pub const BLOOM_MIX: f32 = 0.3;
pub const VIDEO_DIM: f32 = 0.5;
pub const GLITCH_AMPLITUDE: f32 = 0.002;
pub const GLOW_RADIUS: f32 = 0.02;
pub const UI_ALPHA_LOW: f32 = 0.15;
pub const UI_ALPHA_HIGH: f32 = 0.65;
pub const GLOW_TINT: Vec3 = Vec3::new(0.6, 0.8, 1.0);
const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderUniforms {
    pub aspect: f32,
    pub distortion_amount: f32,
    pub bloom_strength: f32,
    pub elapsed_time: f32,
    /// Surface size in window pixels.
    pub resolution: Vec2,
    /// Top-left corner of the surface in window pixels.
    pub surface_origin: Vec2,
    pub aberration: f32,
    pub brightness_flicker: f32,
}

impl ShaderUniforms {
    pub fn new(constants: ShaderConstants, surface: SurfaceRect) -> Self {
        let mut uniforms = Self {
            aspect: LOGICAL_ASPECT,
            distortion_amount: constants.distortion_amount,
            bloom_strength: constants.bloom_strength,
            elapsed_time: 0.0,
            resolution: Vec2::ZERO,
            surface_origin: Vec2::ZERO,
            aberration: constants.aberration,
            brightness_flicker: constants.brightness_flicker,
        };
        uniforms.set_surface(surface);
        uniforms
    }

    /// Resizes move the surface but never change the logical aspect.
    pub fn set_surface(&mut self, surface: SurfaceRect) {
        self.resolution = Vec2::new(surface.width, surface.height);
        self.surface_origin = Vec2::new(surface.x, surface.y);
    }

    pub fn set_constants(&mut self, constants: ShaderConstants) {
        self.distortion_amount = constants.distortion_amount;
        self.bloom_strength = constants.bloom_strength;
        self.aberration = constants.aberration;
        self.brightness_flicker = constants.brightness_flicker;
    }
}

pub trait Texture {
    /// Sample at `uv` (origin top-left), clamping to the edge.
    fn sample(&self, uv: Vec2) -> Vec4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    pub filter: Filter,
}

impl<'a> ImageRef<'a> {
    pub fn new(width: u32, height: u32, pixels: &'a [u8], filter: Filter) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() < expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
            filter,
        })
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        Vec4::new(
            self.pixels[idx] as f32,
            self.pixels[idx + 1] as f32,
            self.pixels[idx + 2] as f32,
            self.pixels[idx + 3] as f32,
        ) / 255.0
    }
}

impl Texture for ImageRef<'_> {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
        let size = Vec2::new(self.width as f32, self.height as f32);
        match self.filter {
            Filter::Nearest => {
                let p = (uv * size).floor();
                self.texel(p.x as i64, p.y as i64)
            }
            Filter::Linear => {
                let p = uv * size - Vec2::splat(0.5);
                let base = p.floor();
                let frac = p - base;
                let (x0, y0) = (base.x as i64, base.y as i64);
                let top = self
                    .texel(x0, y0)
                    .lerp(self.texel(x0 + 1, y0), frac.x);
                let bottom = self
                    .texel(x0, y0 + 1)
                    .lerp(self.texel(x0 + 1, y0 + 1), frac.x);
                top.lerp(bottom, frac.y)
            }
        }
    }
}

/// Constant colour, used while no video frame has arrived.
#[derive(Debug, Clone, Copy)]
pub struct Solid(pub Vec4);

impl Texture for Solid {
    fn sample(&self, _uv: Vec2) -> Vec4 {
        self.0
    }
}

pub fn rounded_rect_distance(point: Vec2, size: Vec2, radius: f32) -> f32 {
    let half = size * 0.5;
    let d = point.abs() - half + Vec2::splat(radius);
    d.max(Vec2::ZERO).length() - radius
}

pub fn noise2d(p: Vec2) -> f32 {
    let v = (p.dot(Vec2::new(12.9898, 78.233))).sin() * 43758.5453;
    v - v.floor()
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(LUMA)
}

pub fn chromatic_aberration(texture: &dyn Texture, uv: Vec2, amount: f32) -> Vec3 {
    let dir = uv - Vec2::splat(0.5);
    let dist = dir.length();
    let offset = if dist > 0.0 {
        dir / dist * amount * dist
    } else {
        Vec2::ZERO
    };
    Vec3::new(
        texture.sample(uv + offset).x,
        texture.sample(uv).y,
        texture.sample(uv - offset).z,
    )
}

/// Barrel distortion of a centred, aspect-scaled coordinate.
pub fn barrel(point: Vec2, amount: f32) -> Vec2 {
    let r = point.length();
    if r == 0.0 {
        return point;
    }
    let distorted = r + amount * r * r * r;
    point * (distorted / r)
}

/// Rolling scanline brightness. `v` is measured from the top, so the bands
/// travel upward the way they do with a bottom-left texture origin.
pub fn scanline_gain(time: f32, v: f32) -> f32 {
    0.95 + 0.1 * (time * 20.0 + (1.0 - v) * 50.0).sin()
}

/// Shade one surface position (`uv` in 0..1, origin top-left). `None` means
/// the pixel is discarded.
pub fn shade(
    uv: Vec2,
    video: &dyn Texture,
    ui: &dyn Texture,
    uniforms: &ShaderUniforms,
) -> Option<Vec3> {
    let aspect = uniforms.aspect;
    let mut centred = uv * 2.0 - Vec2::ONE;
    centred.x *= aspect;

    let distorted = barrel(centred, uniforms.distortion_amount);
    let mask = rounded_rect_distance(
        distorted,
        Vec2::new(aspect * 2.0, 2.0),
        SCREEN_CORNER_RADIUS,
    );
    if mask > 0.0 {
        return None;
    }

    let mut final_uv = distorted;
    final_uv.x /= aspect;
    let final_uv = final_uv * 0.5 + Vec2::splat(0.5);
    if final_uv.x < 0.0 || final_uv.x > 1.0 || final_uv.y < 0.0 || final_uv.y > 1.0 {
        return None;
    }

    let base = chromatic_aberration(video, final_uv, uniforms.aberration);
    let mut bloom = Vec3::ZERO;
    for tap in 0..BLOOM_TAPS {
        let angle = tap as f32 * std::f32::consts::FRAC_PI_4;
        let offset = Vec2::new(angle.cos(), angle.sin()) * BLOOM_RADIUS;
        bloom += chromatic_aberration(video, final_uv + offset, uniforms.aberration)
            / BLOOM_TAPS as f32;
    }
    let video_color = base.lerp(bloom, uniforms.bloom_strength * BLOOM_MIX) * VIDEO_DIM;

    let time = uniforms.elapsed_time;
    let glitch = Vec2::new(
        noise2d(Vec2::new(final_uv.y * 100.0, time * 35.0)) - 0.5,
        noise2d(Vec2::new(final_uv.x * 100.0 + 1000.0, time * 25.0)) - 0.5,
    ) * GLITCH_AMPLITUDE;
    let glitch_uv = final_uv + glitch;

    let text_sample = ui.sample(glitch_uv);
    let alpha = smoothstep(UI_ALPHA_LOW, UI_ALPHA_HIGH, luminance(text_sample.truncate()));

    let glow_offsets = [
        Vec2::new(GLOW_RADIUS, 0.0),
        Vec2::new(-GLOW_RADIUS, 0.0),
        Vec2::new(0.0, GLOW_RADIUS),
        Vec2::new(0.0, -GLOW_RADIUS),
    ];
    let glow: f32 = glow_offsets
        .iter()
        .map(|offset| luminance(ui.sample(glitch_uv + *offset).truncate()) * 0.25)
        .sum();
    let text_color = Vec3::ONE.lerp(GLOW_TINT, glow);

    let mut color = video_color.lerp(text_color, alpha);
    color *= scanline_gain(time, final_uv.y);
    let flicker = uniforms.brightness_flicker;
    color *= 1.0 - flicker + flicker * (time * 100.0).sin();
    Some(color)
}

/// Render a whole window-sized frame. Discarded pixels stay opaque black,
/// matching the renderer's clear colour.
pub fn composite_frame(
    video: &dyn Texture,
    ui: &dyn Texture,
    uniforms: &ShaderUniforms,
    window_width: u32,
    window_height: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(window_width as usize * window_height as usize * 4);
    for y in 0..window_height {
        for x in 0..window_width {
            let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let shaded = if uniforms.resolution.x > 0.0 && uniforms.resolution.y > 0.0 {
                let uv = (pixel - uniforms.surface_origin) / uniforms.resolution;
                shade(uv, video, ui, uniforms)
            } else {
                None
            };
            let color = shaded.unwrap_or(Vec3::ZERO).clamp(Vec3::ZERO, Vec3::ONE);
            out.extend_from_slice(&[
                (color.x * 255.0).round() as u8,
                (color.y * 255.0).round() as u8,
                (color.z * 255.0).round() as u8,
                255,
            ]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms() -> ShaderUniforms {
        ShaderUniforms::new(
            ShaderConstants::DESKTOP,
            SurfaceRect {
                x: 0.0,
                y: 0.0,
                width: 64.0,
                height: 36.0,
            },
        )
    }

    #[test]
    fn corners_are_discarded_and_centre_is_kept() {
        let video = Solid(Vec4::ONE);
        let ui = Solid(Vec4::ZERO);
        let u = uniforms();
        assert!(shade(Vec2::new(0.0, 0.0), &video, &ui, &u).is_none());
        assert!(shade(Vec2::new(1.0, 1.0), &video, &ui, &u).is_none());
        assert!(shade(Vec2::new(0.5, 0.5), &video, &ui, &u).is_some());
    }

    #[test]
    fn video_is_dimmed_when_ui_is_empty() {
        let video = Solid(Vec4::ONE);
        let ui = Solid(Vec4::ZERO);
        let mut u = uniforms();
        u.elapsed_time = 0.0;
        let color = shade(Vec2::new(0.5, 0.5), &video, &ui, &u).expect("centre shaded");
        // flicker at t=0, uv.y=0.5 is 0.95 + 0.1 * sin(25)
        let flicker = 0.95 + 0.1 * 25.0f32.sin();
        assert!((color.x - 0.5 * flicker).abs() < 1e-4);
    }

    #[test]
    fn bright_ui_replaces_video_with_tinted_white() {
        let video = Solid(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let ui = Solid(Vec4::ONE);
        let u = uniforms();
        let color = shade(Vec2::new(0.5, 0.5), &video, &ui, &u).expect("centre shaded");
        let flicker = 0.95 + 0.1 * 25.0f32.sin();
        // full luminance everywhere: alpha 1, glow 1 -> pure tint
        assert!((color - GLOW_TINT * flicker).abs().max_element() < 1e-4);
    }

    #[test]
    fn scanlines_are_measured_from_the_bottom_edge() {
        assert!((scanline_gain(0.0, 0.2) - (0.95 + 0.1 * 40.0f32.sin())).abs() < 1e-5);
        assert!((scanline_gain(0.5, 1.0) - (0.95 + 0.1 * 10.0f32.sin())).abs() < 1e-5);

        let video = Solid(Vec4::ONE);
        let ui = Solid(Vec4::ZERO);
        let mut u = uniforms();
        u.distortion_amount = 0.0;
        let color = shade(Vec2::new(0.5, 0.2), &video, &ui, &u).expect("upper row shaded");
        assert!((color.x - 0.5 * scanline_gain(0.0, 0.2)).abs() < 1e-4);
    }

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(UI_ALPHA_LOW, UI_ALPHA_HIGH, 0.1), 0.0);
        assert_eq!(smoothstep(UI_ALPHA_LOW, UI_ALPHA_HIGH, 0.9), 1.0);
        assert!((smoothstep(UI_ALPHA_LOW, UI_ALPHA_HIGH, 0.4) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn barrel_pushes_points_outward() {
        let p = Vec2::new(0.5, 0.0);
        let d = barrel(p, 0.06);
        assert!((d.x - (0.5 + 0.06 * 0.125)).abs() < 1e-6);
        assert_eq!(barrel(Vec2::ZERO, 0.06), Vec2::ZERO);
    }

    #[test]
    fn noise_stays_in_unit_interval() {
        for i in 0..200 {
            let v = noise2d(Vec2::new(i as f32 * 1.37, i as f32 * 0.11));
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn nearest_and_linear_sampling_clamp_to_edge() {
        let pixels = [0u8, 0, 0, 255, 255, 255, 255, 255];
        let nearest = ImageRef::new(2, 1, &pixels, Filter::Nearest).expect("image");
        assert_eq!(nearest.sample(Vec2::new(0.1, 0.5)).x, 0.0);
        assert_eq!(nearest.sample(Vec2::new(0.9, 0.5)).x, 1.0);
        assert_eq!(nearest.sample(Vec2::new(4.0, -3.0)).x, 1.0);

        let linear = ImageRef::new(2, 1, &pixels, Filter::Linear).expect("image");
        assert!((linear.sample(Vec2::new(0.5, 0.5)).x - 0.5).abs() < 1e-6);
        assert_eq!(linear.sample(Vec2::new(0.0, 0.5)).x, 0.0);
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        assert!(ImageRef::new(2, 2, &[0u8; 8], Filter::Linear).is_none());
    }

    #[test]
    fn frame_is_deterministic_and_black_outside_surface() {
        let video = Solid(Vec4::new(0.2, 0.4, 0.6, 1.0));
        let ui = Solid(Vec4::ZERO);
        let mut u = ShaderUniforms::new(
            ShaderConstants::DESKTOP,
            SurfaceRect {
                x: 0.0,
                y: 9.0,
                width: 32.0,
                height: 18.0,
            },
        );
        u.elapsed_time = 1.25;
        let first = composite_frame(&video, &ui, &u, 32, 36);
        let second = composite_frame(&video, &ui, &u, 32, 36);
        assert_eq!(first, second);
        // Top bar row 0 is outside the surface.
        assert_eq!(&first[0..4], &[0, 0, 0, 255]);
        let centre = ((18 * 32 + 16) * 4) as usize;
        assert!(first[centre + 2] > 0);
    }
}
