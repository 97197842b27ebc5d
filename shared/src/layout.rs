//! Space reserved under the transcript for the composer and any on-screen
//! keyboard, so the last message is never hidden behind either.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualViewport {
    pub height: f64,
    pub offset_top: f64,
}

/// Measurements the shell takes whenever the layout may have shifted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub inner_height: f64,
    /// `None` on hosts without a visual viewport API.
    pub visual_viewport: Option<VisualViewport>,
    pub composer_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTrigger {
    WindowResize,
    OrientationChange,
    VisualViewportResize,
    VisualViewportScroll,
    ComposerResize,
    InputFocus,
}

impl LayoutTrigger {
    #[must_use]
    pub const fn sync_options(self) -> SyncOptions {
        SyncOptions {
            keep_bottom: true,
            smooth: matches!(self, Self::InputFocus),
        }
    }

    /// Visual viewport movement while typing can push the composer off
    /// screen; the shell is asked to bring it back.
    #[must_use]
    pub const fn reveals_composer(self, input_focused: bool) -> bool {
        input_focused && matches!(self, Self::VisualViewportResize | Self::VisualViewportScroll)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub keep_bottom: bool,
    pub smooth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComposerLayout {
    pub composer_offset_px: u32,
    pub keyboard_offset_px: u32,
}

impl ComposerLayout {
    #[must_use]
    pub fn compute(metrics: &ViewportMetrics, safe_inset_px: f64) -> Self {
        let keyboard = metrics.visual_viewport.map_or(0.0, |vv| {
            (finite_or_zero(metrics.inner_height)
                - finite_or_zero(vv.height)
                - finite_or_zero(vv.offset_top))
            .max(0.0)
        });
        let composer = finite_or_zero(metrics.composer_height).max(0.0);
        let offset = composer + keyboard + finite_or_zero(safe_inset_px).max(0.0);

        Self {
            composer_offset_px: to_px(offset),
            keyboard_offset_px: to_px(keyboard),
        }
    }

    #[must_use]
    pub const fn keyboard_open(&self) -> bool {
        self.keyboard_offset_px > 0
    }

    /// `(name, value)` pairs for the CSS custom properties the transcript
    /// container reads.
    #[must_use]
    pub fn css_variables(&self) -> [(&'static str, String); 2] {
        [
            ("--composer-offset", format!("{}px", self.composer_offset_px)),
            ("--keyboard-offset", format!("{}px", self.keyboard_offset_px)),
        ]
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_px(v: f64) -> u32 {
    v.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_without_visual_viewport() {
        let layout = ComposerLayout::compute(
            &ViewportMetrics { inner_height: 900.0, visual_viewport: None, composer_height: 63.2 },
            4.0,
        );
        assert_eq!(layout.composer_offset_px, 68);
        assert_eq!(layout.keyboard_offset_px, 0);
        assert!(!layout.keyboard_open());
    }

    #[test]
    fn mobile_keyboard_adds_to_offset() {
        let layout = ComposerLayout::compute(
            &ViewportMetrics {
                inner_height: 800.0,
                visual_viewport: Some(VisualViewport { height: 480.5, offset_top: 0.0 }),
                composer_height: 60.0,
            },
            4.0,
        );
        assert_eq!(layout.keyboard_offset_px, 320);
        assert_eq!(layout.composer_offset_px, 384);
        assert!(layout.keyboard_open());
    }

    #[test]
    fn scrolled_visual_viewport_never_goes_negative() {
        let layout = ComposerLayout::compute(
            &ViewportMetrics {
                inner_height: 800.0,
                visual_viewport: Some(VisualViewport { height: 800.0, offset_top: 40.0 }),
                composer_height: 50.0,
            },
            4.0,
        );
        assert_eq!(layout.keyboard_offset_px, 0);
        assert_eq!(layout.composer_offset_px, 54);
    }

    #[test]
    fn garbage_measurements_are_ignored() {
        let layout = ComposerLayout::compute(
            &ViewportMetrics { inner_height: f64::NAN, visual_viewport: None, composer_height: f64::INFINITY },
            4.0,
        );
        assert_eq!(layout.composer_offset_px, 4);
    }

    #[test]
    fn css_variables_use_px_units() {
        let layout = ComposerLayout { composer_offset_px: 68, keyboard_offset_px: 0 };
        let vars = layout.css_variables();
        assert_eq!(vars[0], ("--composer-offset", "68px".to_string()));
        assert_eq!(vars[1], ("--keyboard-offset", "0px".to_string()));
    }

    #[test]
    fn only_focus_scrolls_smoothly() {
        assert!(LayoutTrigger::InputFocus.sync_options().smooth);
        assert!(!LayoutTrigger::WindowResize.sync_options().smooth);
        assert!(LayoutTrigger::ComposerResize.sync_options().keep_bottom);
    }

    #[test]
    fn composer_reveal_needs_focus_and_viewport_motion() {
        assert!(LayoutTrigger::VisualViewportResize.reveals_composer(true));
        assert!(!LayoutTrigger::VisualViewportResize.reveals_composer(false));
        assert!(!LayoutTrigger::WindowResize.reveals_composer(true));
    }
}
