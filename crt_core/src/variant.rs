//! Desktop and mobile renditions of the same display, described by a small
//! descriptor instead of separate code paths.

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, ShaderConstants};

pub const RASTER_WIDTH: u32 = 1920;
pub const RASTER_HEIGHT: u32 = 1080;
pub const LOGICAL_ASPECT: f32 = 16.0 / 9.0;
/// Viewports narrower than this pick the mobile layout in `auto` mode.
pub const MOBILE_BREAKPOINT: u32 = 768;
const MOBILE_SURFACE_SCALE: f32 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Desktop,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantChoice {
    #[default]
    Auto,
    Desktop,
    Mobile,
}

impl VariantChoice {
    pub fn resolve(self, viewport_width: u32) -> Variant {
        match self {
            VariantChoice::Desktop => Variant::Desktop,
            VariantChoice::Mobile => Variant::Mobile,
            VariantChoice::Auto if viewport_width < MOBILE_BREAKPOINT => Variant::Mobile,
            VariantChoice::Auto => Variant::Desktop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantConfig {
    pub variant: Variant,
    pub raster_width: u32,
    pub raster_height: u32,
    /// Multiplier applied to the letterboxed surface, about its centre.
    pub surface_scale: f32,
    pub shader: ShaderConstants,
}

impl VariantConfig {
    pub fn new(variant: Variant, config: &AppConfig) -> Self {
        match variant {
            Variant::Desktop => Self {
                variant,
                raster_width: RASTER_WIDTH,
                raster_height: RASTER_HEIGHT,
                surface_scale: 1.0,
                shader: config.desktop_shader,
            },
            Variant::Mobile => Self {
                variant,
                raster_width: RASTER_WIDTH,
                raster_height: RASTER_HEIGHT,
                surface_scale: MOBILE_SURFACE_SCALE,
                shader: config.mobile_shader,
            },
        }
    }
}
