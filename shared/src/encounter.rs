//! The encounter state machine as a pure value.
//!
//! `EncounterState::apply` never mutates in place: it returns the next
//! state or the reason the action was refused, which keeps every stage
//! change traceable and testable without a shell.

use serde::{Deserialize, Serialize};

use crate::api::{CaseId, Identifiers, SessionId};
use crate::config::TransitionPolicy;
use crate::stage::{Controls, Stage, StageControl, StageError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub stage: Stage,
    pub session_id: Option<SessionId>,
    pub case_id: Option<CaseId>,
    pub controls: Controls,
    /// Bumped whenever the session is superseded. Replies tagged with an
    /// older generation are stale.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterAction {
    /// Start over at HISTORY for `case_id`, forgetting the session.
    Begin { case_id: Option<CaseId> },
    /// Supersede in-flight replies without touching anything else.
    Invalidate,
    AdoptIdentifiers(Identifiers),
    Press(StageControl),
    ServerAdvance {
        advance_to: String,
        policy: TransitionPolicy,
    },
    FinalCollected,
}

impl EncounterState {
    pub fn apply(&self, action: EncounterAction) -> Result<Self, StageError> {
        let mut next = self.clone();

        match action {
            EncounterAction::Begin { case_id } => {
                next = Self {
                    case_id,
                    generation: self.generation.wrapping_add(1),
                    ..Self::default()
                };
            }
            EncounterAction::Invalidate => {
                next.generation = self.generation.wrapping_add(1);
            }
            EncounterAction::AdoptIdentifiers(ids) => {
                if let Some(session_id) = ids.session_id.filter(|id| !id.is_blank()) {
                    next.session_id = Some(session_id);
                }
                if let Some(case_id) = ids.case_id.filter(|id| !id.is_blank()) {
                    next.case_id = Some(case_id);
                }
            }
            EncounterAction::Press(control) => {
                if !self.controls.is_enabled(control) {
                    return Err(StageError::ControlDisabled(control));
                }
                let target = control.target_stage();
                self.stage.validate_transition(target)?;
                next.controls = self.controls.after_press(control);
                next.enter(target);
            }
            EncounterAction::ServerAdvance { advance_to, policy } => {
                let target = Stage::from_wire(&advance_to)
                    .ok_or_else(|| StageError::UnknownStage(advance_to.clone()))?;
                if let Err(e) = self.stage.validate_transition(target) {
                    match policy {
                        TransitionPolicy::Strict => return Err(e),
                        TransitionPolicy::Trusted => {
                            tracing::warn!(from = %self.stage, to = %target, "adopting server stage outside the transition table");
                        }
                    }
                }
                next.enter(target);
            }
            EncounterAction::FinalCollected => {
                next.controls.set(StageControl::StartTreatment, true);
            }
        }

        Ok(next)
    }

    fn enter(&mut self, stage: Stage) {
        if self.stage != stage {
            tracing::info!(from = %self.stage, to = %stage, "stage changed");
        }
        self.stage = stage;
        if stage == Stage::Final {
            self.controls.set(StageControl::Finalize, false);
        }
    }

    #[must_use]
    pub fn identifiers(&self) -> Identifiers {
        Identifiers {
            session_id: self.session_id.clone(),
            case_id: self.case_id.clone(),
        }
    }

    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn started(case: &str) -> EncounterState {
        EncounterState::default()
            .apply(EncounterAction::Begin { case_id: Some(CaseId::new(case)) })
            .unwrap()
    }

    fn press(state: &EncounterState, control: StageControl) -> EncounterState {
        state.apply(EncounterAction::Press(control)).unwrap()
    }

    fn advance(state: &EncounterState, to: &str) -> Result<EncounterState, StageError> {
        state.apply(EncounterAction::ServerAdvance {
            advance_to: to.into(),
            policy: TransitionPolicy::Trusted,
        })
    }

    #[test]
    fn begin_resets_everything_but_the_case() {
        let mut state = press(&started("appendicitis"), StageControl::PageAttending);
        state.session_id = Some(SessionId::new("s-1"));

        let fresh = state
            .apply(EncounterAction::Begin { case_id: Some(CaseId::new("asthma")) })
            .unwrap();
        assert_eq!(fresh.stage, Stage::History);
        assert_eq!(fresh.session_id, None);
        assert_eq!(fresh.case_id, Some(CaseId::new("asthma")));
        assert_eq!(fresh.controls, Controls::default());
        assert_eq!(fresh.generation, state.generation + 1);
    }

    #[test]
    fn apply_leaves_the_receiver_untouched() {
        let state = started("appendicitis");
        let _ = press(&state, StageControl::PageAttending);
        assert_eq!(state.stage, Stage::History);
    }

    #[test]
    fn identifiers_are_adopted_but_blank_ones_ignored() {
        let state = started("appendicitis")
            .apply(EncounterAction::AdoptIdentifiers(Identifiers {
                session_id: Some(SessionId::new("s-1")),
                case_id: None,
            }))
            .unwrap();
        assert_eq!(state.session_id, Some(SessionId::new("s-1")));
        assert_eq!(state.case_id, Some(CaseId::new("appendicitis")));

        let state = state
            .apply(EncounterAction::AdoptIdentifiers(Identifiers {
                session_id: Some(SessionId::new("  ")),
                case_id: Some(CaseId::new("appendicitis_v2")),
            }))
            .unwrap();
        assert_eq!(state.session_id, Some(SessionId::new("s-1")));
        assert_eq!(state.case_id, Some(CaseId::new("appendicitis_v2")));
    }

    #[test]
    fn full_button_walk() {
        let state = started("appendicitis");
        let state = press(&state, StageControl::PageAttending);
        assert_eq!(state.stage, Stage::HxDiscuss);
        assert!(state.controls.start_exam);

        let state = press(&state, StageControl::StartExam);
        assert_eq!(state.stage, Stage::Exam);
        assert!(state.controls.finalize);

        let state = press(&state, StageControl::Finalize);
        assert_eq!(state.stage, Stage::DxDiscuss);

        let state = state.apply(EncounterAction::FinalCollected).unwrap();
        let state = advance(&state, "FINAL").unwrap();
        assert_eq!(state.stage, Stage::Final);
        assert!(!state.controls.finalize);
        assert!(state.controls.start_treatment);

        let state = press(&state, StageControl::StartTreatment);
        assert_eq!(state.stage, Stage::Treatment);
        assert!(state.controls.finalize_encounter);

        let state = press(&state, StageControl::FinalizeEncounter);
        assert_eq!(state.stage, Stage::Final);
        assert!(!state.controls.finalize_encounter);
    }

    #[test]
    fn disabled_controls_are_refused() {
        let state = started("appendicitis");
        assert_eq!(
            state.apply(EncounterAction::Press(StageControl::StartExam)),
            Err(StageError::ControlDisabled(StageControl::StartExam))
        );
    }

    #[test]
    fn enabled_but_backwards_press_is_refused() {
        let mut state = press(&started("appendicitis"), StageControl::PageAttending);
        state.stage = Stage::Final;
        assert_matches!(
            state.apply(EncounterAction::Press(StageControl::StartExam)),
            Err(StageError::IllegalTransition { from: Stage::Final, to: Stage::Exam })
        );
    }

    #[test]
    fn trusted_server_advance_ignores_the_table() {
        let state = advance(&started("appendicitis"), "FINAL").unwrap();
        assert_eq!(state.stage, Stage::Final);
        assert!(!state.controls.finalize);
    }

    #[test]
    fn strict_server_advance_enforces_the_table() {
        let result = started("appendicitis").apply(EncounterAction::ServerAdvance {
            advance_to: "FINAL".into(),
            policy: TransitionPolicy::Strict,
        });
        assert_matches!(result, Err(StageError::IllegalTransition { .. }));
    }

    #[test]
    fn unknown_stage_is_a_mismatch() {
        assert_eq!(
            advance(&started("appendicitis"), "DISCHARGE"),
            Err(StageError::UnknownStage("DISCHARGE".into()))
        );
    }

    #[test]
    fn invalidate_only_bumps_generation() {
        let state = press(&started("appendicitis"), StageControl::PageAttending);
        let next = state.apply(EncounterAction::Invalidate).unwrap();
        assert_eq!(next.stage, state.stage);
        assert!(!next.is_current(state.generation));
        assert!(next.is_current(state.generation + 1));
    }
}
