//! Off-screen UI raster: title, separator, the two link buttons and the
//! credit line. Redrawn only when hover progress moves.

use std::sync::Arc;

use log::debug;

use crate::config::TextConfig;
use crate::error::CanvasError;
use crate::glyphs::GlyphSource;
use crate::hover::{ButtonId, HoverState};
use crate::raster::{Raster, Rgba, RoundedRect};
use crate::variant::{Variant, VariantConfig};

/// Below this hover progress a label keeps its dark outline and shadow.
pub const OUTLINE_PROGRESS_CUTOFF: f32 = 0.1;

const WHITE: Rgba = Rgba::rgb(255.0, 255.0, 255.0);
const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
const RULE_COLOR: Rgba = Rgba::new(255.0, 255.0, 255.0, 0.6);
const BUTTON_FILL: Rgba = Rgba::new(100.0, 100.0, 120.0, 1.0);
const SHADOW: Shadow = Shadow {
    color: Rgba::new(0.0, 0.0, 0.0, 0.85),
    blur: 6.0,
};
const OUTLINE_WIDTH: f32 = 3.0;

const DESKTOP_TITLE_SIZE: f32 = 45.0;
const DESKTOP_TITLE_X: f32 = 60.0;
const DESKTOP_TITLE_STROKE_TOP: f32 = 40.0;
const DESKTOP_TITLE_FILL_TOP: f32 = 30.0;
const DESKTOP_RULE_Y: f32 = 90.0;
const DESKTOP_RULE_WIDTH: f32 = 2.0;
pub(crate) const DESKTOP_BUTTON_FONT_SIZE: f32 = 40.0;
const DESKTOP_BUTTON_LABEL_X: f32 = 75.0;
const DESKTOP_BUTTON_LABEL_TOP: f32 = 120.0;
const DESKTOP_BUTTON_GAP: f32 = 20.0;
const DESKTOP_BUTTON_PADDING_X: f32 = 16.0;
const DESKTOP_BUTTON_PADDING_Y: f32 = 6.0;
const DESKTOP_BUTTON_HEIGHT: f32 = 50.0;
const DESKTOP_BUTTON_RADIUS: f32 = 6.0;
const DESKTOP_CREDIT_MARGIN_X: f32 = 60.0;
const DESKTOP_CREDIT_MARGIN_BOTTOM: f32 = 85.0;

const MOBILE_TITLE_SIZE: f32 = 80.0;
const MOBILE_TITLE_CENTER_OFFSET: f32 = 200.0;
const MOBILE_TITLE_LINE_STEP: f32 = 100.0;
const MOBILE_GAP: f32 = 30.0;
const MOBILE_TITLE_BLOCK: f32 = 150.0;
const MOBILE_RULE_MARGIN: f32 = 20.0;
const MOBILE_RULE_HALF_WIDTH: f32 = 300.0;
const MOBILE_RULE_WIDTH: f32 = 4.0;
const MOBILE_BUTTON_FONT_SIZE: f32 = 70.0;
const MOBILE_BUTTON_PADDING_X: f32 = 30.0;
const MOBILE_BUTTON_HEIGHT: f32 = 110.0;
const MOBILE_BUTTON_RADIUS: f32 = 10.0;
const MOBILE_BORDER_WIDTH: f32 = 3.0;

pub fn button_fill_alpha(progress: f32) -> f32 {
    0.2 + 0.8 * progress.clamp(0.0, 1.0)
}

/// Grey level of a button label: white when idle, black when fully hovered.
pub fn label_channel(progress: f32) -> u8 {
    (255.0 * (1.0 - progress.clamp(0.0, 1.0))).round() as u8
}

#[derive(Debug, Clone, Copy)]
struct Shadow {
    color: Rgba,
    blur: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonGlyph {
    pub button: ButtonId,
    pub label_x: f32,
    pub label_top: f32,
    pub font_size: f32,
    pub bounds: RoundedRect,
    pub border_width: f32,
}

pub struct UiCanvas {
    raster: Raster,
    font: Arc<dyn GlyphSource>,
    variant: Variant,
    text: TextConfig,
    buttons: [ButtonGlyph; 2],
}

impl UiCanvas {
    pub fn new(
        variant: &VariantConfig,
        text: &TextConfig,
        font: Arc<dyn GlyphSource>,
    ) -> Result<Self, CanvasError> {
        let raster = Raster::new(variant.raster_width, variant.raster_height)?;
        let buttons = match variant.variant {
            Variant::Desktop => desktop_buttons(font.as_ref()),
            Variant::Mobile => mobile_buttons(
                font.as_ref(),
                variant.raster_width as f32,
                variant.raster_height as f32,
            ),
        };
        Ok(Self {
            raster,
            font,
            variant: variant.variant,
            text: text.clone(),
            buttons,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn font(&self) -> &dyn GlyphSource {
        self.font.as_ref()
    }

    pub fn buttons(&self) -> &[ButtonGlyph; 2] {
        &self.buttons
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn mark_uploaded(&mut self) {
        self.raster.mark_uploaded();
    }

    /// Redraw the whole raster for the given hover state. The result is a pure
    /// function of `hover` and the fixed layout.
    pub fn render(&mut self, hover: &HoverState) -> &Raster {
        self.raster.clear();
        match self.variant {
            Variant::Desktop => self.draw_desktop(hover),
            Variant::Mobile => self.draw_mobile(hover),
        }
        debug!(
            "ui raster redrawn ({:?}, homebrew {:.3}, tools {:.3})",
            self.variant,
            hover.progress(ButtonId::Homebrew),
            hover.progress(ButtonId::Tools)
        );
        self.raster.mark_dirty();
        &self.raster
    }

    fn draw_desktop(&mut self, hover: &HoverState) {
        let title = self.text.title.clone();
        self.stroke_text(
            &title,
            DESKTOP_TITLE_X,
            DESKTOP_TITLE_STROKE_TOP,
            DESKTOP_TITLE_SIZE,
            Some(SHADOW),
        );
        self.fill_text(
            &title,
            DESKTOP_TITLE_X,
            DESKTOP_TITLE_FILL_TOP,
            DESKTOP_TITLE_SIZE,
            WHITE,
            Some(SHADOW),
        );

        let title_width = self.font.measure(&title, DESKTOP_TITLE_SIZE);
        self.raster.stroke_line(
            (DESKTOP_TITLE_X, DESKTOP_RULE_Y),
            (DESKTOP_TITLE_X + title_width, DESKTOP_RULE_Y),
            DESKTOP_RULE_WIDTH,
            RULE_COLOR,
        );

        for glyph in self.buttons {
            self.draw_button(glyph, hover.progress(glyph.button));
        }

        let credit = self.text.credit.clone();
        let credit_width = self.font.measure(&credit, DESKTOP_TITLE_SIZE);
        let credit_x = self.raster.width() as f32 - credit_width - DESKTOP_CREDIT_MARGIN_X;
        let credit_top = self.raster.height() as f32 - DESKTOP_CREDIT_MARGIN_BOTTOM;
        self.stroke_text(&credit, credit_x, credit_top, DESKTOP_TITLE_SIZE, Some(SHADOW));
        self.fill_text(&credit, credit_x, credit_top, DESKTOP_TITLE_SIZE, WHITE, Some(SHADOW));
    }

    fn draw_mobile(&mut self, hover: &HoverState) {
        let center_x = self.raster.width() as f32 * 0.5;
        let first_line = self.raster.height() as f32 * 0.5 - MOBILE_TITLE_CENTER_OFFSET;

        let lines = self.text.mobile_title.clone();
        for (index, line) in lines.iter().enumerate() {
            let middle = first_line + index as f32 * MOBILE_TITLE_LINE_STEP;
            let width = self.font.measure(line, MOBILE_TITLE_SIZE);
            self.fill_text(
                line,
                center_x - width * 0.5,
                middle - MOBILE_TITLE_SIZE * 0.5,
                MOBILE_TITLE_SIZE,
                WHITE,
                None,
            );
        }

        let rule_y = mobile_rule_y(first_line);
        self.raster.stroke_line(
            (center_x - MOBILE_RULE_HALF_WIDTH, rule_y),
            (center_x + MOBILE_RULE_HALF_WIDTH, rule_y),
            MOBILE_RULE_WIDTH,
            RULE_COLOR,
        );

        for glyph in self.buttons {
            self.draw_button(glyph, hover.progress(glyph.button));
        }
    }

    fn draw_button(&mut self, glyph: ButtonGlyph, progress: f32) {
        self.raster.fill_rounded_rect(
            glyph.bounds,
            BUTTON_FILL.with_alpha(button_fill_alpha(progress)),
        );
        self.raster
            .stroke_rounded_rect(glyph.bounds, glyph.border_width, RULE_COLOR);

        let label = glyph.button.label();
        let channel = label_channel(progress) as f32;
        let color = Rgba::rgb(channel, channel, channel);
        let outlined = progress < OUTLINE_PROGRESS_CUTOFF;
        let shadow = outlined.then_some(SHADOW);
        if outlined {
            self.stroke_text(label, glyph.label_x, glyph.label_top, glyph.font_size, shadow);
        }
        self.fill_text(label, glyph.label_x, glyph.label_top, glyph.font_size, color, shadow);
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        top: f32,
        size: f32,
        color: Rgba,
        shadow: Option<Shadow>,
    ) {
        let mask = self.font.layout_line(text, x, top, size);
        if let Some(shadow) = shadow {
            let soft = mask.blurred((shadow.blur * 0.5).round() as i32);
            self.raster.blend_mask(&soft, shadow.color);
        }
        self.raster.blend_mask(&mask, color);
    }

    fn stroke_text(&mut self, text: &str, x: f32, top: f32, size: f32, shadow: Option<Shadow>) {
        let mask = self
            .font
            .layout_line(text, x, top, size)
            .dilated((OUTLINE_WIDTH * 0.5).round() as i32);
        if let Some(shadow) = shadow {
            let soft = mask.blurred((shadow.blur * 0.5).round() as i32);
            self.raster.blend_mask(&soft, shadow.color);
        }
        self.raster.blend_mask(&mask, BLACK);
    }
}

fn desktop_buttons(font: &dyn GlyphSource) -> [ButtonGlyph; 2] {
    let tools_top = DESKTOP_BUTTON_LABEL_TOP + DESKTOP_BUTTON_HEIGHT + DESKTOP_BUTTON_GAP;
    ButtonId::ALL.map(|button| {
        let label_top = match button {
            ButtonId::Homebrew => DESKTOP_BUTTON_LABEL_TOP,
            ButtonId::Tools => tools_top,
        };
        let width =
            font.measure(button.label(), DESKTOP_BUTTON_FONT_SIZE) + DESKTOP_BUTTON_PADDING_X * 2.0;
        ButtonGlyph {
            button,
            label_x: DESKTOP_BUTTON_LABEL_X,
            label_top,
            font_size: DESKTOP_BUTTON_FONT_SIZE,
            bounds: RoundedRect {
                x: DESKTOP_BUTTON_LABEL_X - DESKTOP_BUTTON_PADDING_X,
                y: label_top - DESKTOP_BUTTON_PADDING_Y * 0.5,
                width,
                height: DESKTOP_BUTTON_HEIGHT,
                radius: DESKTOP_BUTTON_RADIUS,
            },
            border_width: 1.0,
        }
    })
}

fn mobile_rule_y(first_line: f32) -> f32 {
    first_line + MOBILE_TITLE_BLOCK + MOBILE_GAP
}

fn mobile_buttons(font: &dyn GlyphSource, raster_width: f32, raster_height: f32) -> [ButtonGlyph; 2] {
    let center_x = raster_width * 0.5;
    let first_line = raster_height * 0.5 - MOBILE_TITLE_CENTER_OFFSET;
    let first_top = mobile_rule_y(first_line) + MOBILE_GAP + MOBILE_RULE_MARGIN;
    ButtonId::ALL.map(|button| {
        let top = match button {
            ButtonId::Homebrew => first_top,
            ButtonId::Tools => first_top + MOBILE_BUTTON_HEIGHT + MOBILE_GAP,
        };
        let text_width = font.measure(button.label(), MOBILE_BUTTON_FONT_SIZE);
        let width = text_width + MOBILE_BUTTON_PADDING_X * 2.0;
        ButtonGlyph {
            button,
            label_x: center_x - text_width * 0.5,
            label_top: top + (MOBILE_BUTTON_HEIGHT - MOBILE_BUTTON_FONT_SIZE) * 0.5,
            font_size: MOBILE_BUTTON_FONT_SIZE,
            bounds: RoundedRect {
                x: center_x - width * 0.5,
                y: top,
                width,
                height: MOBILE_BUTTON_HEIGHT,
                radius: MOBILE_BUTTON_RADIUS,
            },
            border_width: MOBILE_BORDER_WIDTH,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::glyphs::BitmapFont;

    fn canvas(variant: Variant) -> UiCanvas {
        let config = AppConfig::default();
        UiCanvas::new(
            &VariantConfig::new(variant, &config),
            &config.text,
            Arc::new(BitmapFont),
        )
        .expect("canvas")
    }

    #[test]
    fn fill_alpha_and_label_channel_are_monotonic_and_bounded() {
        let mut previous_alpha = f32::MIN;
        let mut previous_channel = u8::MAX;
        for step in 0..=100 {
            let progress = step as f32 / 100.0;
            let alpha = button_fill_alpha(progress);
            let channel = label_channel(progress);
            assert!((0.2..=1.0).contains(&alpha));
            assert!(alpha >= previous_alpha);
            assert!(channel <= previous_channel);
            previous_alpha = alpha;
            previous_channel = channel;
        }
        assert_eq!(button_fill_alpha(0.0), 0.2);
        assert_eq!(button_fill_alpha(1.0), 1.0);
        assert_eq!(label_channel(0.0), 255);
        assert_eq!(label_channel(1.0), 0);
        assert_eq!(label_channel(0.5), 128);
    }

    #[test]
    fn desktop_buttons_follow_measured_labels() {
        let canvas = canvas(Variant::Desktop);
        let [homebrew, tools] = *canvas.buttons();
        assert_eq!(homebrew.bounds.x, 59.0);
        assert_eq!(homebrew.bounds.y, 117.0);
        assert_eq!(homebrew.bounds.width, 192.0 + 32.0);
        assert_eq!(tools.label_top, 190.0);
        assert_eq!(tools.bounds.y, 187.0);
        assert_eq!(tools.bounds.width, 120.0 + 32.0);
    }

    #[test]
    fn hover_darkens_button_background_toward_opaque() {
        let mut canvas = canvas(Variant::Desktop);
        let corner = canvas.buttons()[0].bounds;
        let (px, py) = ((corner.x + 4.0) as u32, (corner.y + corner.height - 4.0) as u32);

        let idle_alpha = canvas.render(&HoverState::new()).pixel(px, py)[3];

        let mut hover = HoverState::new();
        hover.set_hovered(Some(ButtonId::Homebrew));
        for _ in 0..80 {
            hover.step();
        }
        let hovered_alpha = canvas.render(&hover).pixel(px, py)[3];
        assert!(hovered_alpha > idle_alpha);
        assert!(hovered_alpha >= 250);
    }

    #[test]
    fn render_marks_raster_dirty() {
        let mut canvas = canvas(Variant::Mobile);
        canvas.mark_uploaded();
        assert!(!canvas.raster().is_dirty());
        canvas.render(&HoverState::new());
        assert!(canvas.raster().is_dirty());
    }

    #[test]
    fn mobile_buttons_are_centred() {
        let canvas = canvas(Variant::Mobile);
        for glyph in canvas.buttons() {
            let center = glyph.bounds.x + glyph.bounds.width * 0.5;
            assert!((center - 960.0).abs() < 1e-3);
            assert_eq!(glyph.bounds.height, 110.0);
        }
        assert_eq!(canvas.buttons()[0].bounds.y, 570.0);
        assert_eq!(canvas.buttons()[1].bounds.y, 710.0);
    }
}
