//! Encounter stages, the stage-advance controls, and the tables that tie
//! them together.
//!
//! Every mapping here is an exhaustive `match`, so adding a stage or a
//! control is a compile error until each table has an answer for it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::Endpoint;
use crate::error::{AppError, ErrorKind};
use crate::transcript::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    History,
    HxDiscuss,
    Exam,
    DxDiscuss,
    Final,
    Treatment,
}

impl Stage {
    pub const ALL: [Self; 6] = [
        Self::History,
        Self::HxDiscuss,
        Self::Exam,
        Self::DxDiscuss,
        Self::Final,
        Self::Treatment,
    ];

    /// Parses the wire name used by `advance_to`.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HISTORY" => Some(Self::History),
            "HX_DISCUSS" => Some(Self::HxDiscuss),
            "EXAM" => Some(Self::Exam),
            "DX_DISCUSS" => Some(Self::DxDiscuss),
            "FINAL" => Some(Self::Final),
            "TREATMENT" => Some(Self::Treatment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "HISTORY",
            Self::HxDiscuss => "HX_DISCUSS",
            Self::Exam => "EXAM",
            Self::DxDiscuss => "DX_DISCUSS",
            Self::Final => "FINAL",
            Self::Treatment => "TREATMENT",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::History => "History",
            Self::HxDiscuss => "History Discussion",
            Self::Exam => "Physical Exam",
            Self::DxDiscuss => "Diagnosis Discussion",
            Self::Final => "Final Assessment",
            Self::Treatment => "Treatment",
        }
    }

    /// Where free-text chat goes while the encounter is in this stage.
    #[must_use]
    pub const fn chat_endpoint(self) -> Endpoint {
        match self {
            Self::History => Endpoint::PatientChat,
            Self::HxDiscuss => Endpoint::HistoryDiscuss,
            Self::Exam => Endpoint::ExamChat,
            Self::DxDiscuss => Endpoint::FinalCollect,
            Self::Final => Endpoint::FinalFollowups,
            Self::Treatment => Endpoint::TreatmentAssess,
        }
    }

    /// Role used for a chat reply that does not name one.
    #[must_use]
    pub const fn default_reply_role(self) -> Role {
        match self {
            Self::History => Role::Patient,
            Self::HxDiscuss | Self::Exam | Self::DxDiscuss | Self::Final | Self::Treatment => {
                Role::Attending
            }
        }
    }

    #[must_use]
    pub const fn indicator(self) -> StageIndicator {
        match self {
            Self::History => StageIndicator::History,
            Self::HxDiscuss => StageIndicator::Control(StageControl::PageAttending),
            Self::Exam => StageIndicator::Control(StageControl::StartExam),
            Self::DxDiscuss => StageIndicator::Control(StageControl::Finalize),
            Self::Treatment => StageIndicator::Control(StageControl::StartTreatment),
            Self::Final => StageIndicator::Control(StageControl::FinalizeEncounter),
        }
    }

    /// Stages reachable in one step, not counting staying put.
    ///
    /// FINAL and TREATMENT point at each other: a student may start the
    /// treatment discussion after the final assessment, and the treatment
    /// assessment hands the encounter back to FINAL.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::History => &[Self::HxDiscuss],
            Self::HxDiscuss => &[Self::Exam],
            Self::Exam => &[Self::DxDiscuss],
            Self::DxDiscuss => &[Self::Final, Self::Treatment],
            Self::Final => &[Self::Treatment],
            Self::Treatment => &[Self::Final],
        }
    }

    #[must_use]
    pub fn can_advance_to(self, to: Self) -> bool {
        self == to || self.successors().contains(&to)
    }

    pub fn validate_transition(self, to: Self) -> Result<(), StageError> {
        if self.can_advance_to(to) {
            Ok(())
        } else {
            Err(StageError::IllegalTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five stage-advance buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageControl {
    PageAttending,
    StartExam,
    Finalize,
    StartTreatment,
    FinalizeEncounter,
}

impl StageControl {
    pub const ALL: [Self; 5] = [
        Self::PageAttending,
        Self::StartExam,
        Self::Finalize,
        Self::StartTreatment,
        Self::FinalizeEncounter,
    ];

    #[must_use]
    pub const fn target_stage(self) -> Stage {
        match self {
            Self::PageAttending => Stage::HxDiscuss,
            Self::StartExam => Stage::Exam,
            Self::Finalize => Stage::DxDiscuss,
            Self::StartTreatment => Stage::Treatment,
            Self::FinalizeEncounter => Stage::Final,
        }
    }

    #[must_use]
    pub const fn intro_endpoint(self) -> Endpoint {
        match self {
            Self::PageAttending => Endpoint::AttendingOpen,
            Self::StartExam => Endpoint::ExamIntro,
            Self::Finalize => Endpoint::FinalPrompt,
            Self::StartTreatment => Endpoint::StartTreatment,
            Self::FinalizeEncounter => Endpoint::FinalizeEncounter,
        }
    }

    /// `sys` message appended when the control is pressed.
    #[must_use]
    pub const fn announcement(self) -> Option<&'static str> {
        match self {
            Self::PageAttending => Some("You paged the attending."),
            Self::StartExam => Some(
                "You started the physical exam phase. Ask the attending for exam findings.",
            ),
            Self::Finalize => Some(
                "Share your leading diagnosis and differentials. Then submit here to get the final assessment.",
            ),
            Self::StartTreatment | Self::FinalizeEncounter => None,
        }
    }

    /// Element id the web shell renders this control under.
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::PageAttending => "btn-finish-history",
            Self::StartExam => "btn-start-exam",
            Self::Finalize => "btn-finalize",
            Self::StartTreatment => "btn-start-tx",
            Self::FinalizeEncounter => "btn-finalize-encounter",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PageAttending => "Page Attending",
            Self::StartExam => "Start Exam",
            Self::Finalize => "Finalize Diagnosis",
            Self::StartTreatment => "Start Treatment",
            Self::FinalizeEncounter => "Finalize Encounter",
        }
    }
}

/// Which element carries the active-stage highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "control", rename_all = "snake_case")]
pub enum StageIndicator {
    History,
    Control(StageControl),
}

impl StageIndicator {
    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::History => "stage-history",
            Self::Control(control) => control.element_id(),
        }
    }
}

/// Enablement of the stage-advance controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub page_attending: bool,
    pub start_exam: bool,
    pub finalize: bool,
    pub start_treatment: bool,
    pub finalize_encounter: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            page_attending: true,
            start_exam: false,
            finalize: false,
            start_treatment: false,
            finalize_encounter: false,
        }
    }
}

impl Controls {
    #[must_use]
    pub const fn is_enabled(&self, control: StageControl) -> bool {
        match control {
            StageControl::PageAttending => self.page_attending,
            StageControl::StartExam => self.start_exam,
            StageControl::Finalize => self.finalize,
            StageControl::StartTreatment => self.start_treatment,
            StageControl::FinalizeEncounter => self.finalize_encounter,
        }
    }

    pub fn set(&mut self, control: StageControl, enabled: bool) {
        let slot = match control {
            StageControl::PageAttending => &mut self.page_attending,
            StageControl::StartExam => &mut self.start_exam,
            StageControl::Finalize => &mut self.finalize,
            StageControl::StartTreatment => &mut self.start_treatment,
            StageControl::FinalizeEncounter => &mut self.finalize_encounter,
        };
        *slot = enabled;
    }

    /// Flags after `control` has been pressed: the next step opens up and
    /// the completed one closes.
    #[must_use]
    pub fn after_press(mut self, control: StageControl) -> Self {
        match control {
            StageControl::PageAttending => {
                self.page_attending = false;
                self.start_exam = true;
            }
            StageControl::StartExam => {
                self.start_exam = false;
                self.finalize = true;
            }
            // stays enabled for the whole diagnosis discussion
            StageControl::Finalize => {}
            StageControl::StartTreatment => {
                self.start_treatment = false;
                self.finalize = false;
                self.finalize_encounter = true;
            }
            StageControl::FinalizeEncounter => {
                self.finalize_encounter = false;
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("{} is not available right now", .0.label())]
    ControlDisabled(StageControl),
    #[error("cannot move from {from} to {to}")]
    IllegalTransition { from: Stage, to: Stage },
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
}

impl From<StageError> for AppError {
    fn from(e: StageError) -> Self {
        let kind = match e {
            StageError::ControlDisabled(_) => ErrorKind::Validation,
            StageError::IllegalTransition { .. } | StageError::UnknownStage(_) => {
                ErrorKind::StageMismatch
            }
        };
        AppError::new(kind, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_serde() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
            assert_eq!(Stage::from_wire(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn from_wire_is_lenient_about_case_and_whitespace() {
        assert_eq!(Stage::from_wire(" final "), Some(Stage::Final));
        assert_eq!(Stage::from_wire("hx_discuss"), Some(Stage::HxDiscuss));
        assert_eq!(Stage::from_wire("DISCHARGE"), None);
        assert_eq!(Stage::from_wire(""), None);
    }

    #[test]
    fn chat_routing_table() {
        assert_eq!(Stage::History.chat_endpoint().path(), "/api/patient/chat");
        assert_eq!(Stage::HxDiscuss.chat_endpoint().path(), "/api/attending/history_discuss");
        assert_eq!(Stage::Exam.chat_endpoint().path(), "/api/attending/exam_chat");
        assert_eq!(Stage::DxDiscuss.chat_endpoint().path(), "/api/attending/final_collect");
        assert_eq!(Stage::Final.chat_endpoint().path(), "/api/attending/final_followups");
        assert_eq!(Stage::Treatment.chat_endpoint().path(), "/api/attending/treatment_assess");
    }

    #[test]
    fn only_history_defaults_to_patient() {
        for stage in Stage::ALL {
            let expected = if stage == Stage::History { Role::Patient } else { Role::Attending };
            assert_eq!(stage.default_reply_role(), expected);
        }
    }

    #[test]
    fn each_stage_lights_a_distinct_indicator() {
        let mut ids: Vec<_> = Stage::ALL.iter().map(|s| s.indicator().element_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Stage::ALL.len());
    }

    #[test]
    fn transitions_follow_the_declared_sequence() {
        assert!(Stage::History.can_advance_to(Stage::HxDiscuss));
        assert!(Stage::DxDiscuss.can_advance_to(Stage::Treatment));
        assert!(Stage::Final.can_advance_to(Stage::Treatment));
        assert!(Stage::Treatment.can_advance_to(Stage::Final));
        assert!(Stage::Exam.can_advance_to(Stage::Exam));

        assert!(!Stage::History.can_advance_to(Stage::Final));
        assert!(!Stage::Exam.can_advance_to(Stage::History));
        assert_eq!(
            Stage::Final.validate_transition(Stage::Exam),
            Err(StageError::IllegalTransition { from: Stage::Final, to: Stage::Exam })
        );
    }

    #[test]
    fn press_opens_the_next_control() {
        let controls = Controls::default().after_press(StageControl::PageAttending);
        assert!(!controls.page_attending);
        assert!(controls.start_exam);

        let controls = controls.after_press(StageControl::StartExam);
        assert!(!controls.start_exam);
        assert!(controls.finalize);

        let controls = controls.after_press(StageControl::Finalize);
        assert!(controls.finalize);
    }

    #[test]
    fn starting_treatment_closes_the_diagnosis_control() {
        let mut controls = Controls::default();
        controls.set(StageControl::Finalize, true);
        controls.set(StageControl::StartTreatment, true);

        let controls = controls.after_press(StageControl::StartTreatment);
        assert!(!controls.finalize);
        assert!(!controls.start_treatment);
        assert!(controls.finalize_encounter);
    }

    #[test]
    fn stage_error_maps_into_taxonomy() {
        let err: AppError = StageError::UnknownStage("DISCHARGE".into()).into();
        assert_eq!(err.kind, ErrorKind::StageMismatch);

        let err: AppError = StageError::ControlDisabled(StageControl::StartExam).into();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Start Exam is not available right now");
    }
}
