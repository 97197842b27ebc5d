use serde::{Deserialize, Serialize};

use crate::cases::CaseCatalog;
use crate::config::Config;
use crate::encounter::EncounterState;
use crate::error::AppError;
use crate::layout::ComposerLayout;
use crate::transcript::{Role, ScrollMetrics, Transcript};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub config: Config,

    pub encounter: EncounterState,
    pub transcript: Transcript,
    pub catalog: CaseCatalog,

    // Layout, as last measured by the shell
    pub layout: ComposerLayout,
    pub scroll: Option<ScrollMetrics>,
    pub input_focused: bool,

    /// Chat and intro calls of the current generation still awaiting a reply.
    pub pending_replies: usize,
    pub creating_case: bool,
    pub last_error: Option<AppError>,
}

impl Model {
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// No scroll report yet counts as being at the bottom.
    #[must_use]
    pub fn is_near_bottom(&self) -> bool {
        match self.scroll {
            Some(scroll) => scroll.is_near_bottom(self.config.near_bottom_threshold_px),
            None => true,
        }
    }

    /// Whether appending a `role` message should pull the transcript down.
    #[must_use]
    pub fn should_follow(&self, role: Role) -> bool {
        self.config.auto_scroll.forces_bottom(role) || self.is_near_bottom()
    }

    pub fn set_error(&mut self, error: AppError) {
        tracing::warn!(
            code = error.code(),
            retryable = error.is_retryable(),
            error = %error,
            "surfacing error"
        );
        self.transcript.push(error.user_facing_message(), Role::Sys);
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::AutoScrollPolicy;

    fn scrolled_up() -> ScrollMetrics {
        ScrollMetrics { scroll_height: 2000.0, scroll_top: 200.0, client_height: 600.0 }
    }

    #[test]
    fn unreported_scroll_counts_as_bottom() {
        assert!(Model::default().is_near_bottom());
    }

    #[test]
    fn reader_scrolled_up_is_left_alone() {
        let model = Model { scroll: Some(scrolled_up()), ..Model::default() };
        assert!(!model.should_follow(Role::Patient));
        assert!(model.should_follow(Role::You));
    }

    #[test]
    fn always_policy_follows_everything() {
        let config = Config { auto_scroll: AutoScrollPolicy::Always, ..Config::default() };
        let model = Model { scroll: Some(scrolled_up()), ..Model::with_config(config) };
        assert!(model.should_follow(Role::Attending));
    }

    #[test]
    fn errors_land_in_the_transcript() {
        let mut model = Model::default();
        model.set_error(AppError::validation("title is required"));
        let last = model.transcript.last().unwrap();
        assert_eq!(last.role, Role::Sys);
        assert_eq!(last.text, "title is required");
        assert!(model.last_error.is_some());
    }
}
