//! Maps pointer positions onto the UI raster and decides which button, if
//! any, sits underneath.
//!
//! The desktop regions are calibrated separately from the drawn button
//! rectangles: they sit lower and to the right and lean upward across their
//! width so they line up with the labels as seen through the barrel
//! distortion.

use crate::canvas::{ButtonGlyph, DESKTOP_BUTTON_FONT_SIZE, UiCanvas};
use crate::glyphs::GlyphSource;
use crate::hover::ButtonId;
use crate::surface::SurfaceRect;
use crate::variant::Variant;

const DESKTOP_REGION_X: f32 = 160.0;
const DESKTOP_REGION_Y: f32 = 170.0;
const DESKTOP_REGION_HEIGHT: f32 = 50.0;
const DESKTOP_CURVATURE: f32 = -15.0;
const HOMEBREW_OFFSET_X: f32 = 13.0;
const HOMEBREW_WIDTH_TRIM: f32 = 14.0;
const TOOLS_OFFSET_X: f32 = 10.0;
const TOOLS_ROW_STEP: f32 = 70.0;
const TOOLS_OFFSET_Y: f32 = -5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonRegion {
    pub button: ButtonId,
    pub label: String,
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
    /// Vertical shift of the band across its full width; negative leans up.
    pub curvature: f32,
}

impl ButtonRegion {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || x < self.origin_x || x > self.origin_x + self.width {
            return false;
        }
        let t = (x - self.origin_x) / self.width;
        let curved_y = self.origin_y + self.curvature * t;
        y >= curved_y && y <= curved_y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitRegions {
    raster_width: f32,
    raster_height: f32,
    pub(crate) regions: Vec<ButtonRegion>,
}

impl HitRegions {
    pub fn new(raster_size: (u32, u32), regions: Vec<ButtonRegion>) -> Self {
        Self {
            raster_width: raster_size.0 as f32,
            raster_height: raster_size.1 as f32,
            regions,
        }
    }

    pub fn for_canvas(canvas: &UiCanvas) -> Self {
        let raster_size = canvas.raster().size();
        match canvas.variant() {
            Variant::Desktop => Self::new(raster_size, desktop_regions(canvas.font())),
            Variant::Mobile => Self::new(raster_size, drawn_regions(canvas.buttons())),
        }
    }

    /// First region (in priority order) containing the raster-space point.
    pub fn locate_raster(&self, x: f32, y: f32) -> Option<ButtonId> {
        self.regions
            .iter()
            .find(|region| region.contains(x, y))
            .map(|region| region.button)
    }

    /// Button under a window-space pointer, given where the surface is drawn.
    pub fn locate(&self, px: f32, py: f32, surface: SurfaceRect) -> Option<ButtonId> {
        let (x, y) = self.screen_to_raster(px, py, surface)?;
        self.locate_raster(x, y)
    }

    pub fn screen_to_raster(&self, px: f32, py: f32, surface: SurfaceRect) -> Option<(f32, f32)> {
        let (nx, ny) = surface.normalize(px, py)?;
        Some((nx * self.raster_width, ny * self.raster_height))
    }
}

pub fn desktop_regions(font: &dyn GlyphSource) -> Vec<ButtonRegion> {
    ButtonId::ALL
        .iter()
        .map(|&button| {
            let measured = font.measure(button.label(), DESKTOP_BUTTON_FONT_SIZE);
            let (origin_x, origin_y, width) = match button {
                ButtonId::Homebrew => (
                    DESKTOP_REGION_X + HOMEBREW_OFFSET_X,
                    DESKTOP_REGION_Y,
                    measured - HOMEBREW_WIDTH_TRIM,
                ),
                ButtonId::Tools => (
                    DESKTOP_REGION_X + TOOLS_OFFSET_X,
                    DESKTOP_REGION_Y + TOOLS_ROW_STEP + TOOLS_OFFSET_Y,
                    measured,
                ),
            };
            ButtonRegion {
                button,
                label: button.label().to_string(),
                origin_x,
                origin_y,
                width,
                height: DESKTOP_REGION_HEIGHT,
                curvature: DESKTOP_CURVATURE,
            }
        })
        .collect()
}

fn drawn_regions(buttons: &[ButtonGlyph]) -> Vec<ButtonRegion> {
    buttons
        .iter()
        .map(|glyph| ButtonRegion {
            button: glyph.button,
            label: glyph.button.label().to_string(),
            origin_x: glyph.bounds.x,
            origin_y: glyph.bounds.y,
            width: glyph.bounds.width,
            height: glyph.bounds.height,
            curvature: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::BitmapFont;
    use crate::surface::letterbox;
    use crate::variant::LOGICAL_ASPECT;

    fn desktop() -> HitRegions {
        HitRegions::new((1920, 1080), desktop_regions(&BitmapFont))
    }

    #[test]
    fn desktop_regions_use_calibrated_offsets() {
        let regions = desktop();
        let [homebrew, tools] = regions.regions.as_slice() else {
            panic!("expected two regions");
        };
        assert_eq!((homebrew.origin_x, homebrew.origin_y), (173.0, 170.0));
        assert_eq!(homebrew.width, 192.0 - 14.0);
        assert_eq!((tools.origin_x, tools.origin_y), (170.0, 235.0));
        assert_eq!(tools.width, 120.0);
        assert_eq!(tools.label, "tools");
    }

    #[test]
    fn origin_is_inside_and_left_neighbour_is_not() {
        let regions = desktop();
        for region in &regions.regions {
            assert!(region.contains(region.origin_x, region.origin_y));
            assert!(!region.contains(region.origin_x - 1.0, region.origin_y));
            assert_eq!(
                regions.locate_raster(region.origin_x, region.origin_y),
                Some(region.button)
            );
        }
    }

    #[test]
    fn curvature_shifts_the_band_linearly() {
        let region = ButtonRegion {
            button: ButtonId::Homebrew,
            label: "homebrew".into(),
            origin_x: 100.0,
            origin_y: 200.0,
            width: 100.0,
            height: 50.0,
            curvature: -20.0,
        };
        // Halfway across the band is lifted by 10.
        assert!(region.contains(150.0, 190.0));
        assert!(!region.contains(150.0, 189.0));
        assert!(region.contains(150.0, 240.0));
        assert!(!region.contains(150.0, 241.0));
        // At the right edge the full shift applies.
        assert!(region.contains(200.0, 180.0));
        assert!(!region.contains(200.0, 231.0));
        // At the left edge none of it does.
        assert!(!region.contains(100.0, 199.0));
        assert!(!region.contains(201.0, 200.0));
    }

    #[test]
    fn screen_points_map_through_the_surface() {
        let regions = desktop();
        let surface = letterbox(1024, 768, LOGICAL_ASPECT);
        // Raster (180, 190) lands at 1024/1920 scale plus the 96px top bar.
        let scale = 1024.0 / 1920.0;
        let px = 180.0 * scale;
        let py = 96.0 + 190.0 * scale;
        assert_eq!(regions.locate(px, py, surface), Some(ButtonId::Homebrew));
        assert_eq!(regions.locate(5.0, 5.0, surface), None);
    }

    #[test]
    fn empty_surface_never_hits() {
        let regions = desktop();
        assert_eq!(regions.screen_to_raster(10.0, 10.0, SurfaceRect::EMPTY), None);
        assert_eq!(regions.locate(180.0, 190.0, SurfaceRect::EMPTY), None);
    }
}
