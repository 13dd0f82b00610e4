//! Core of the CRT display front-end: hover animation, hit testing, the UI
//! raster, a CPU reference of the compositing pass and the frame driver.
//! Nothing here touches a window or a GPU.

pub mod canvas;
pub mod composite;
pub mod config;
pub mod error;
pub mod frame;
pub mod glyphs;
pub mod hit_test;
pub mod hover;
pub mod raster;
pub mod session;
pub mod surface;
pub mod variant;

pub use canvas::UiCanvas;
pub use composite::{ShaderUniforms, composite_frame};
pub use config::{AppConfig, ShaderConstants, load_config};
pub use error::{CanvasError, ConfigError, VideoError};
pub use frame::{FrameDriver, FrameReport, FrameSink, FrameView, VideoSource};
pub use glyphs::{BitmapFont, GlyphSource, TrueTypeFont};
pub use hit_test::{ButtonRegion, HitRegions};
pub use hover::{ButtonId, HoverState};
pub use raster::Raster;
pub use session::{CursorStyle, EventKind, Host, InputEvent, Session, Subscription};
pub use surface::SurfaceRect;
pub use variant::{Variant, VariantChoice, VariantConfig};
