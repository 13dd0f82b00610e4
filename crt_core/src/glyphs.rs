//! Glyph sources for the UI canvas. Text is placed with a "top" baseline: the
//! y coordinate handed to the canvas is the top of the em box.

use std::fs;
use std::path::Path;

use font8x8::legacy::BASIC_LEGACY;
use fontdue::{Font, FontSettings};

use crate::error::CanvasError;
use crate::raster::CoverageMask;

/// Horizontal advance of a monospace glyph relative to the font size.
pub const MONOSPACE_ADVANCE_EM: f32 = 0.6;

const BITMAP_SUBSAMPLES: u32 = 4;
const BITMAP_GLYPH_HEIGHT_EM: f32 = 0.72;
const BITMAP_GLYPH_TOP_EM: f32 = 0.14;

pub trait GlyphSource {
    fn advance(&self, ch: char, size: f32) -> f32;

    /// Coverage for `ch` with its origin at the pen position on the em-box top.
    fn rasterize(&self, ch: char, size: f32) -> CoverageMask;

    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, size)).sum()
    }

    /// Coverage of a whole line positioned at `(x, top)` on the raster.
    fn layout_line(&self, text: &str, x: f32, top: f32, size: f32) -> CoverageMask {
        let glyphs: Vec<(f32, CoverageMask)> = text
            .chars()
            .scan(0.0f32, |pen, ch| {
                let at = *pen;
                *pen += self.advance(ch, size);
                Some((at, self.rasterize(ch, size)))
            })
            .collect();

        let placed: Vec<CoverageMask> = glyphs
            .into_iter()
            .filter(|(_, glyph)| glyph.width > 0 && glyph.height > 0)
            .map(|(pen, glyph)| glyph.translated((x + pen).round() as i32, top.round() as i32))
            .collect();

        let Some(first) = placed.first() else {
            return CoverageMask::new(x.round() as i32, top.round() as i32, 0, 0);
        };
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x + first.width as i32;
        let mut max_y = first.y + first.height as i32;
        for glyph in &placed[1..] {
            min_x = min_x.min(glyph.x);
            min_y = min_y.min(glyph.y);
            max_x = max_x.max(glyph.x + glyph.width as i32);
            max_y = max_y.max(glyph.y + glyph.height as i32);
        }

        let mut line = CoverageMask::new(
            min_x,
            min_y,
            (max_x - min_x) as u32,
            (max_y - min_y) as u32,
        );
        for glyph in &placed {
            for gy in 0..glyph.height as i32 {
                for gx in 0..glyph.width as i32 {
                    line.accumulate(
                        glyph.x - min_x + gx,
                        glyph.y - min_y + gy,
                        glyph.get(gx, gy),
                    );
                }
            }
        }
        line
    }
}

/// Built-in 8x8 bitmap font scaled to the requested size with box-filtered
/// edges. Monospace, so measurements match a Courier-style layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapFont;

impl BitmapFont {
    fn rows(ch: char) -> [u8; 8] {
        let index = ch as usize;
        if index < BASIC_LEGACY.len() {
            BASIC_LEGACY[index]
        } else {
            BASIC_LEGACY[b'?' as usize]
        }
    }
}

impl GlyphSource for BitmapFont {
    fn advance(&self, _ch: char, size: f32) -> f32 {
        size * MONOSPACE_ADVANCE_EM
    }

    fn rasterize(&self, ch: char, size: f32) -> CoverageMask {
        let cell_width = self.advance(ch, size);
        let glyph_height = size * BITMAP_GLYPH_HEIGHT_EM;
        let width = cell_width.ceil().max(0.0) as u32;
        let height = glyph_height.ceil().max(0.0) as u32;
        let top = (size * BITMAP_GLYPH_TOP_EM).round() as i32;
        let mut mask = CoverageMask::new(0, top, width, height);
        if width == 0 || height == 0 {
            return mask;
        }

        let rows = Self::rows(ch);
        let samples = BITMAP_SUBSAMPLES * BITMAP_SUBSAMPLES;
        for py in 0..height {
            for px in 0..width {
                let mut hits = 0u32;
                for sy in 0..BITMAP_SUBSAMPLES {
                    for sx in 0..BITMAP_SUBSAMPLES {
                        let fx = px as f32 + (sx as f32 + 0.5) / BITMAP_SUBSAMPLES as f32;
                        let fy = py as f32 + (sy as f32 + 0.5) / BITMAP_SUBSAMPLES as f32;
                        let col = (fx / cell_width * 8.0) as usize;
                        let row = (fy / glyph_height * 8.0) as usize;
                        if col < 8 && row < 8 && (rows[row] >> col) & 0x01 != 0 {
                            hits += 1;
                        }
                    }
                }
                if hits > 0 {
                    mask.accumulate(px as i32, py as i32, (hits * 255 / samples) as u8);
                }
            }
        }
        mask
    }
}

pub struct TrueTypeFont {
    font: Font,
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self, CanvasError> {
        let bytes = fs::read(path).map_err(|source| CanvasError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            CanvasError::FontParse {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        Ok(Self { font })
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(size * 0.8)
    }
}

impl GlyphSource for TrueTypeFont {
    fn advance(&self, ch: char, size: f32) -> f32 {
        self.font.metrics(ch, size).advance_width
    }

    fn rasterize(&self, ch: char, size: f32) -> CoverageMask {
        let (metrics, bitmap) = self.font.rasterize(ch, size);
        let baseline = self.ascent(size).round() as i32;
        let glyph_top = baseline - (metrics.ymin + metrics.height as i32);
        CoverageMask {
            x: metrics.xmin,
            y: glyph_top,
            width: metrics.width as u32,
            height: metrics.height as u32,
            coverage: bitmap,
        }
    }
}
