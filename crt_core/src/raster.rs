//! Software RGBA raster used as the UI texture source.
//!
//! Backed by a `tiny_skia::Pixmap`, so pixels are premultiplied and partially
//! covered glyph edges carry proportionally lower luminance when the
//! compositor samples them.

use tiny_skia::{
    Color, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::error::CanvasError;

// Control-point distance for a quarter circle drawn as one cubic.
const ARC_KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Channels in 0..=255 and alpha in 0..=1, the same units CSS colours use.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    fn to_skia(self) -> Color {
        let byte = |value: f32| value.round().clamp(0.0, 255.0) as u8;
        Color::from_rgba8(
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a * 255.0),
        )
    }

    fn paint(self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.to_skia());
        paint.anti_alias = true;
        paint
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl CoverageMask {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            coverage: vec![0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Max-combine `value` at local coordinates.
    pub fn accumulate(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.coverage[idx] = self.coverage[idx].max(value);
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    /// Grow the mask by `radius` pixels in every direction, the way a centred
    /// stroke of width `2 * radius` widens a glyph outline.
    pub fn dilated(&self, radius: i32) -> Self {
        if radius <= 0 {
            return self.clone();
        }
        let pad = radius as u32;
        let mut out = CoverageMask::new(
            self.x - radius,
            self.y - radius,
            self.width + pad * 2,
            self.height + pad * 2,
        );
        let r2 = radius * radius;
        for y in 0..out.height as i32 {
            for x in 0..out.width as i32 {
                let mut best = 0u8;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx * dx + dy * dy > r2 {
                            continue;
                        }
                        best = best.max(self.get(x - radius + dx, y - radius + dy));
                    }
                }
                out.coverage[y as usize * out.width as usize + x as usize] = best;
            }
        }
        out
    }

    /// Two-pass box blur, padded so the soft edge is not clipped.
    pub fn blurred(&self, radius: i32) -> Self {
        if radius <= 0 {
            return self.clone();
        }
        let pad = radius as u32;
        let width = self.width + pad * 2;
        let height = self.height + pad * 2;
        let window = (radius * 2 + 1) as u32;

        let mut horizontal = vec![0u32; width as usize * height as usize];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut sum = 0u32;
                for dx in -radius..=radius {
                    sum += self.get(x - radius + dx, y - radius) as u32;
                }
                horizontal[y as usize * width as usize + x as usize] = sum;
            }
        }

        let mut out = CoverageMask::new(self.x - radius, self.y - radius, width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut sum = 0u32;
                for dy in -radius..=radius {
                    let sy = y + dy;
                    if sy < 0 || sy >= height as i32 {
                        continue;
                    }
                    sum += horizontal[sy as usize * width as usize + x as usize];
                }
                out.coverage[y as usize * width as usize + x as usize] =
                    (sum / (window * window)).min(255) as u8;
            }
        }
        out
    }
}

pub struct Raster {
    pixmap: Pixmap,
    dirty: bool,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let pixmap = Pixmap::new(width, height).ok_or(CanvasError::EmptyRaster { width, height })?;
        Ok(Self {
            pixmap,
            dirty: true,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Premultiplied RGBA8 rows, tightly packed.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width() as usize + x as usize) * 4;
        let data = self.pixmap.data();
        [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag; the caller has uploaded the pixels.
    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
        self.dirty = true;
    }

    /// Source-over composite of `color` weighted by the mask's coverage.
    pub fn blend_mask(&mut self, mask: &CoverageMask, color: Rgba) {
        let Some(mut layer) = Pixmap::new(mask.width, mask.height) else {
            return;
        };
        let alpha = color.a.clamp(0.0, 1.0);
        for (texel, &coverage) in layer.data_mut().chunks_exact_mut(4).zip(&mask.coverage) {
            if coverage == 0 {
                continue;
            }
            let weight = alpha * coverage as f32 / 255.0;
            texel[0] = (color.r * weight).round().clamp(0.0, 255.0) as u8;
            texel[1] = (color.g * weight).round().clamp(0.0, 255.0) as u8;
            texel[2] = (color.b * weight).round().clamp(0.0, 255.0) as u8;
            texel[3] = (255.0 * weight).round().clamp(0.0, 255.0) as u8;
        }
        self.pixmap.draw_pixmap(
            mask.x,
            mask.y,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.dirty = true;
    }

    pub fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Rgba) {
        if let Some(path) = rect.to_path() {
            self.pixmap.fill_path(
                &path,
                &color.paint(),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
            self.dirty = true;
        }
    }

    pub fn stroke_rounded_rect(&mut self, rect: RoundedRect, line_width: f32, color: Rgba) {
        if let Some(path) = rect.to_path() {
            self.stroke(&path, line_width, color);
        }
    }

    /// Butt-capped segment of the given width.
    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), line_width: f32, color: Rgba) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0, from.1);
        builder.line_to(to.0, to.1);
        if let Some(path) = builder.finish() {
            self.stroke(&path, line_width, color);
        }
    }

    fn stroke(&mut self, path: &Path, line_width: f32, color: Rgba) {
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &color.paint(), &stroke, Transform::identity(), None);
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl RoundedRect {
    /// Closed outline with quarter-circle corners; `None` for an empty rect.
    pub fn to_path(&self) -> Option<Path> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let r = self
            .radius
            .min(self.width * 0.5)
            .min(self.height * 0.5)
            .max(0.0);
        let k = r * ARC_KAPPA;
        let (left, top) = (self.x, self.y);
        let (right, bottom) = (self.x + self.width, self.y + self.height);

        let mut pb = PathBuilder::new();
        pb.move_to(left + r, top);
        pb.line_to(right - r, top);
        pb.cubic_to(right - r + k, top, right, top + r - k, right, top + r);
        pb.line_to(right, bottom - r);
        pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
        pb.line_to(left + r, bottom);
        pb.cubic_to(left + r - k, bottom, left, bottom - r + k, left, bottom - r);
        pb.line_to(left, top + r);
        pb.cubic_to(left, top + r - k, left + r - k, top, left + r, top);
        pb.close();
        pb.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_mask(x: i32, y: i32, width: u32, height: u32, value: u8) -> CoverageMask {
        CoverageMask {
            x,
            y,
            width,
            height,
            coverage: vec![value; width as usize * height as usize],
        }
    }

    #[test]
    fn empty_raster_is_rejected() {
        assert!(matches!(
            Raster::new(0, 10),
            Err(CanvasError::EmptyRaster { width: 0, height: 10 })
        ));
    }

    #[test]
    fn opaque_mask_replaces_pixel_and_marks_dirty() {
        let mut raster = Raster::new(4, 4).expect("raster");
        raster.mark_uploaded();
        raster.blend_mask(&solid_mask(1, 2, 1, 1, 255), Rgba::rgb(255.0, 128.0, 0.0));
        assert!(raster.is_dirty());
        assert_eq!(raster.pixel(1, 2), [255, 128, 0, 255]);
        assert_eq!(raster.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn partial_coverage_is_premultiplied() {
        let mut raster = Raster::new(2, 2).expect("raster");
        raster.blend_mask(&solid_mask(0, 0, 1, 1, 128), Rgba::rgb(255.0, 255.0, 255.0));
        let [r, g, b, a] = raster.pixel(0, 0);
        assert!(a.abs_diff(128) <= 1);
        assert_eq!([r, g, b], [a, a, a]);
    }

    #[test]
    fn masks_hanging_off_the_edge_are_clipped() {
        let mut raster = Raster::new(2, 2).expect("raster");
        raster.blend_mask(&solid_mask(-3, 0, 2, 2, 255), Rgba::rgb(255.0, 0.0, 0.0));
        raster.blend_mask(&solid_mask(0, 5, 2, 2, 255), Rgba::rgb(255.0, 0.0, 0.0));
        assert!(raster.pixels().iter().all(|&byte| byte == 0));

        raster.blend_mask(&solid_mask(-1, -1, 2, 2, 255), Rgba::rgb(255.0, 0.0, 0.0));
        assert_eq!(raster.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(raster.pixel(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn rounded_rect_corners_are_cut() {
        let rect = RoundedRect {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 10.0,
            radius: 4.0,
        };
        let mut raster = Raster::new(24, 14).expect("raster");
        raster.fill_rounded_rect(rect, Rgba::rgb(255.0, 255.0, 255.0));
        assert_eq!(raster.pixel(0, 0)[3], 0);
        assert_eq!(raster.pixel(10, 5)[3], 255);
        assert_eq!(raster.pixel(10, 0)[3], 255);
        assert_eq!(raster.pixel(22, 5)[3], 0);
    }

    #[test]
    fn degenerate_rect_has_no_path() {
        let rect = RoundedRect {
            x: 4.0,
            y: 4.0,
            width: 0.0,
            height: 10.0,
            radius: 2.0,
        };
        assert!(rect.to_path().is_none());
        let mut raster = Raster::new(8, 8).expect("raster");
        raster.mark_uploaded();
        raster.fill_rounded_rect(rect, Rgba::rgb(255.0, 255.0, 255.0));
        assert!(!raster.is_dirty());
    }

    #[test]
    fn stroke_leaves_the_interior_empty() {
        let rect = RoundedRect {
            x: 2.0,
            y: 2.0,
            width: 16.0,
            height: 12.0,
            radius: 3.0,
        };
        let mut raster = Raster::new(20, 16).expect("raster");
        raster.stroke_rounded_rect(rect, 2.0, Rgba::rgb(255.0, 255.0, 255.0));
        assert_eq!(raster.pixel(10, 8)[3], 0);
        assert!(raster.pixel(10, 2)[3] > 0);
    }

    #[test]
    fn dilation_grows_a_single_pixel_into_a_disc() {
        let mut mask = CoverageMask::new(5, 5, 1, 1);
        mask.accumulate(0, 0, 255);
        let grown = mask.dilated(2);
        assert_eq!((grown.x, grown.y, grown.width, grown.height), (3, 3, 5, 5));
        assert_eq!(grown.get(2, 0), 255);
        assert_eq!(grown.get(0, 0), 0);
    }

    #[test]
    fn blur_spreads_but_preserves_bounds() {
        let mut mask = CoverageMask::new(0, 0, 3, 3);
        for y in 0..3 {
            for x in 0..3 {
                mask.accumulate(x, y, 255);
            }
        }
        let soft = mask.blurred(1);
        assert_eq!(soft.width, 5);
        assert_eq!(soft.get(2, 2), 255);
        assert!(soft.get(0, 0) > 0 && soft.get(0, 0) < 255);
    }

    #[test]
    fn horizontal_line_covers_its_row() {
        let mut raster = Raster::new(20, 10).expect("raster");
        raster.stroke_line((2.0, 5.0), (18.0, 5.0), 2.0, Rgba::rgb(255.0, 255.0, 255.0));
        assert!(raster.pixel(10, 4)[3] >= 250);
        assert!(raster.pixel(10, 5)[3] >= 250);
        assert_eq!(raster.pixel(10, 8)[3], 0);
        assert_eq!(raster.pixel(0, 5)[3], 0);
    }
}
