use crate::variant::LOGICAL_ASPECT;

/// Placement of the rendering surface inside the window, in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub const EMPTY: SurfaceRect = SurfaceRect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn scaled_about_center(&self, scale: f32) -> Self {
        let (cx, cy) = self.center();
        let width = self.width * scale;
        let height = self.height * scale;
        Self {
            x: cx - width * 0.5,
            y: cy - height * 0.5,
            width,
            height,
        }
    }

    /// Position of a window-space point relative to the surface, in 0..1 when
    /// inside. `None` while the surface has no area.
    pub fn normalize(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }
        Some(((px - self.x) / self.width, (py - self.y) / self.height))
    }
}

/// Largest rectangle of `aspect` that fits the viewport, centred, leaving
/// bars on the long axis.
pub fn letterbox(viewport_width: u32, viewport_height: u32, aspect: f32) -> SurfaceRect {
    if viewport_width == 0 || viewport_height == 0 || aspect <= 0.0 {
        return SurfaceRect::EMPTY;
    }
    let vw = viewport_width as f32;
    let vh = viewport_height as f32;
    let (width, height) = if vw / vh > aspect {
        (vh * aspect, vh)
    } else {
        (vw, vw / aspect)
    };
    SurfaceRect {
        x: (vw - width) * 0.5,
        y: (vh - height) * 0.5,
        width,
        height,
    }
}

pub fn surface_for_viewport(viewport_width: u32, viewport_height: u32, scale: f32) -> SurfaceRect {
    letterbox(viewport_width, viewport_height, LOGICAL_ASPECT).scaled_about_center(scale)
}
