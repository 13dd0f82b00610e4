//! Owns the per-window state (hover animation, UI raster, hit regions and
//! shader uniforms) and reacts to input delivered through host-provided
//! subscriptions.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::canvas::UiCanvas;
use crate::composite::ShaderUniforms;
use crate::config::AppConfig;
use crate::error::CanvasError;
use crate::glyphs::GlyphSource;
use crate::hit_test::HitRegions;
use crate::hover::{ButtonId, HoverState};
use crate::surface::{SurfaceRect, surface_for_viewport};
use crate::variant::VariantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    Click,
    Resize,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::PointerMove, EventKind::Click, EventKind::Resize];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    Resize { width: u32, height: u32 },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::PointerMove { .. } => EventKind::PointerMove,
            InputEvent::Click { .. } => EventKind::Click,
            InputEvent::Resize { .. } => EventKind::Resize,
        }
    }
}

pub trait Host {
    fn subscribe(&mut self, kind: EventKind) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
    /// Open `url` in a new top-level context, detached from this process.
    fn open_url(&mut self, url: &str) -> anyhow::Result<()>;
    fn set_cursor(&mut self, cursor: CursorStyle);
}

pub struct Session {
    config: AppConfig,
    font: Arc<dyn GlyphSource>,
    variant: VariantConfig,
    canvas: UiCanvas,
    regions: HitRegions,
    hover: HoverState,
    surface: SurfaceRect,
    uniforms: ShaderUniforms,
    subscriptions: Vec<Subscription>,
}

impl Session {
    pub fn new(
        config: AppConfig,
        font: Arc<dyn GlyphSource>,
        viewport: (u32, u32),
    ) -> Result<Self, CanvasError> {
        let variant = VariantConfig::new(config.variant.resolve(viewport.0), &config);
        let mut canvas = UiCanvas::new(&variant, &config.text, font.clone())?;
        let hover = HoverState::new();
        canvas.render(&hover);
        let regions = HitRegions::for_canvas(&canvas);
        let surface = surface_for_viewport(viewport.0, viewport.1, variant.surface_scale);
        let uniforms = ShaderUniforms::new(variant.shader, surface);
        info!(
            "session created: {:?} layout, viewport {}x{}",
            variant.variant, viewport.0, viewport.1
        );
        Ok(Self {
            config,
            font,
            variant,
            canvas,
            regions,
            hover,
            surface,
            uniforms,
            subscriptions: Vec::new(),
        })
    }

    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    pub fn canvas(&self) -> &UiCanvas {
        &self.canvas
    }

    pub fn surface(&self) -> SurfaceRect {
        self.surface
    }

    pub fn uniforms(&self) -> &ShaderUniforms {
        &self.uniforms
    }

    pub fn set_elapsed(&mut self, seconds: f32) {
        self.uniforms.elapsed_time = seconds;
    }

    pub fn mark_ui_uploaded(&mut self) {
        self.canvas.mark_uploaded();
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscriptions.iter().any(|sub| sub.kind == kind)
    }

    /// Register for pointer-move, click and resize. A second mount while
    /// already mounted registers nothing.
    pub fn mount(&mut self, host: &mut dyn Host) {
        if self.is_mounted() {
            debug!("session already mounted");
            return;
        }
        self.subscriptions = EventKind::ALL
            .iter()
            .map(|&kind| host.subscribe(kind))
            .collect();
        info!("session mounted ({} subscriptions)", self.subscriptions.len());
    }

    /// Release exactly the subscriptions taken by `mount`. Safe to repeat.
    pub fn unmount(&mut self, host: &mut dyn Host) {
        if self.subscriptions.is_empty() {
            return;
        }
        for subscription in self.subscriptions.drain(..) {
            host.unsubscribe(subscription);
        }
        info!("session unmounted");
    }

    pub fn handle(&mut self, host: &mut dyn Host, event: InputEvent) -> Result<(), CanvasError> {
        if !self.is_subscribed(event.kind()) {
            return Ok(());
        }
        match event {
            InputEvent::PointerMove { x, y } => {
                self.handle_pointer_move(host, x, y);
            }
            InputEvent::Click { x, y } => {
                self.handle_click(host, x, y);
            }
            InputEvent::Resize { width, height } => self.handle_resize(width, height)?,
        }
        Ok(())
    }

    /// Update hover targets for the pointer position; the cursor changes only
    /// when the hovered button does.
    pub fn handle_pointer_move(&mut self, host: &mut dyn Host, x: f32, y: f32) -> Option<ButtonId> {
        let hovered = self.regions.locate(x, y, self.surface);
        if self.hover.set_hovered(hovered) {
            debug!("hover -> {:?}", hovered);
            host.set_cursor(if hovered.is_some() {
                CursorStyle::Pointer
            } else {
                CursorStyle::Default
            });
        }
        hovered
    }

    /// Open the link under the pointer, if any. Hover state is untouched.
    pub fn handle_click(&mut self, host: &mut dyn Host, x: f32, y: f32) -> Option<ButtonId> {
        let button = self.regions.locate(x, y, self.surface)?;
        let url = self.config.links.url_for(button);
        info!("opening {} for {}", url, button.label());
        if let Err(err) = host.open_url(url) {
            warn!("failed to open {url}: {err:#}");
        }
        Some(button)
    }

    /// Refit the surface to the new viewport. In auto mode crossing the mobile
    /// breakpoint swaps the layout, which rebuilds the raster and regions.
    /// A zero-area viewport (a minimised window) keeps the current layout.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        if width == 0 || height == 0 {
            debug!("viewport {width}x{height} is empty, keeping {:?}", self.variant.variant);
            self.surface = SurfaceRect::EMPTY;
            self.uniforms.set_surface(self.surface);
            return Ok(());
        }
        let variant = self.config.variant.resolve(width);
        if variant != self.variant.variant {
            info!("switching to {:?} layout at width {width}", variant);
            let descriptor = VariantConfig::new(variant, &self.config);
            let mut canvas = UiCanvas::new(&descriptor, &self.config.text, self.font.clone())?;
            canvas.render(&self.hover);
            self.regions = HitRegions::for_canvas(&canvas);
            self.canvas = canvas;
            self.variant = descriptor;
            self.uniforms.set_constants(descriptor.shader);
        }
        self.surface = surface_for_viewport(width, height, self.variant.surface_scale);
        self.uniforms.set_surface(self.surface);
        debug!("viewport {width}x{height}, surface {:?}", self.surface);
        Ok(())
    }

    pub fn advance_hover(&mut self) -> bool {
        if self.hover.step() {
            self.canvas.render(&self.hover);
            true
        } else {
            false
        }
    }
}
