//! Per-button hover animation. Pointer handling sets 0/1 targets; every frame
//! the progress values ease toward them and the caller learns whether the UI
//! raster needs to be redrawn.

use serde::{Deserialize, Serialize};

/// Fraction of the remaining distance covered by each `step`.
pub const HOVER_EASE_RATE: f32 = 0.1;
/// Progress closer than this to its target counts as settled.
pub const HOVER_SETTLE_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonId {
    Homebrew,
    Tools,
}

impl ButtonId {
    /// Fixed priority order used by hit-testing and drawing.
    pub const ALL: [ButtonId; 2] = [ButtonId::Homebrew, ButtonId::Tools];

    pub fn index(self) -> usize {
        match self {
            ButtonId::Homebrew => 0,
            ButtonId::Tools => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonId::Homebrew => "homebrew",
            ButtonId::Tools => "tools",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct HoverChannel {
    progress: f32,
    target: f32,
}

impl HoverChannel {
    fn step(&mut self) {
        self.progress += (self.target - self.progress) * HOVER_EASE_RATE;
    }

    fn in_motion(&self) -> bool {
        (self.progress - self.target).abs() > HOVER_SETTLE_EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoverState {
    active: Option<ButtonId>,
    channels: [HoverChannel; 2],
}

impl HoverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ButtonId> {
        self.active
    }

    pub fn progress(&self, button: ButtonId) -> f32 {
        self.channels[button.index()].progress
    }

    pub fn target(&self, button: ButtonId) -> f32 {
        self.channels[button.index()].target
    }

    /// Record which button (if any) is under the pointer. Returns `true` when
    /// the hovered button changed, which is also when the cursor style should
    /// be refreshed.
    pub fn set_hovered(&mut self, hovered: Option<ButtonId>) -> bool {
        if hovered == self.active {
            return false;
        }
        self.active = hovered;
        for button in ButtonId::ALL {
            self.channels[button.index()].target = if hovered == Some(button) { 1.0 } else { 0.0 };
        }
        true
    }

    /// Ease both channels toward their targets. Returns `true` while either
    /// channel is still farther than [`HOVER_SETTLE_EPSILON`] from its target.
    pub fn step(&mut self) -> bool {
        for channel in &mut self.channels {
            channel.step();
        }
        self.channels.iter().any(HoverChannel::in_motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entering_a_button_targets_it_and_clears_the_other() {
        let mut hover = HoverState::new();
        assert!(hover.set_hovered(Some(ButtonId::Tools)));
        assert!(hover.set_hovered(Some(ButtonId::Homebrew)));
        assert_eq!(hover.target(ButtonId::Homebrew), 1.0);
        assert_eq!(hover.target(ButtonId::Tools), 0.0);
        assert_eq!(hover.active(), Some(ButtonId::Homebrew));
    }

    #[test]
    fn repeated_hover_on_same_button_is_not_a_change() {
        let mut hover = HoverState::new();
        assert!(hover.set_hovered(Some(ButtonId::Tools)));
        assert!(!hover.set_hovered(Some(ButtonId::Tools)));
        assert!(hover.set_hovered(None));
        assert_eq!(hover.target(ButtonId::Tools), 0.0);
        assert!(!hover.set_hovered(None));
    }

    #[test]
    fn stepping_converges_monotonically_and_settles() {
        let mut hover = HoverState::new();
        hover.set_hovered(Some(ButtonId::Homebrew));

        let mut previous_distance = 1.0f32;
        let mut settled_at = None;
        for tick in 0..200 {
            let moving = hover.step();
            let distance = 1.0 - hover.progress(ButtonId::Homebrew);
            assert!(distance < previous_distance, "tick {tick} did not approach target");
            assert!((0.0..=1.0).contains(&hover.progress(ButtonId::Homebrew)));
            previous_distance = distance;
            if !moving {
                assert!(distance <= HOVER_SETTLE_EPSILON);
                settled_at = Some(tick);
                break;
            }
            assert!(distance > HOVER_SETTLE_EPSILON);
        }
        // 0.9^n <= 0.01 first holds at n = 44.
        assert_eq!(settled_at, Some(43));
    }

    #[test]
    fn idle_state_reports_no_motion() {
        let mut hover = HoverState::new();
        assert!(!hover.step());
        assert_eq!(hover.progress(ButtonId::Homebrew), 0.0);
    }

    #[test]
    fn leaving_eases_back_to_zero() {
        let mut hover = HoverState::new();
        hover.set_hovered(Some(ButtonId::Tools));
        for _ in 0..60 {
            hover.step();
        }
        hover.set_hovered(None);
        for _ in 0..60 {
            hover.step();
        }
        assert!(hover.progress(ButtonId::Tools) < 0.01);
        assert!(hover.progress(ButtonId::Tools) >= 0.0);
    }
}
