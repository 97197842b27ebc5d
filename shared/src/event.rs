use serde::{Deserialize, Serialize};

use crate::api::{
    CaseDraft, CaseId, CaseListResponse, CreateCaseResponse, ReplyResponse, ResetAck,
    SessionStartResponse,
};
use crate::config::Config;
use crate::error::AppError;
use crate::layout::{LayoutTrigger, ViewportMetrics};
use crate::stage::{Stage, StageControl};
use crate::transcript::ScrollMetrics;

/// Everything that can happen to the core.
///
/// Responses to session-scoped calls carry the encounter generation they
/// were sent under; see [`crate::encounter::EncounterState::generation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Noop,
    Configure(Config),
    AppStarted,

    /// `select` names a case to prefer once the list arrives.
    CasesLoaded {
        select: Option<CaseId>,
        result: Result<CaseListResponse, AppError>,
    },
    CaseSelected {
        case_id: CaseId,
    },
    SessionStarted {
        generation: u64,
        result: Result<SessionStartResponse, AppError>,
    },
    ResetRequested,
    ResetResponse {
        generation: u64,
        result: Result<ResetAck, AppError>,
    },

    ChatSubmitted {
        text: String,
    },
    /// `stage` is the stage the message was sent in.
    ChatResponse {
        generation: u64,
        stage: Stage,
        result: Result<ReplyResponse, AppError>,
    },
    StageControlPressed(StageControl),
    StageControlResponse {
        generation: u64,
        control: StageControl,
        result: Result<ReplyResponse, AppError>,
    },

    CreateCaseRequested(CaseDraft),
    CaseCreated(Result<CreateCaseResponse, AppError>),

    ViewportChanged {
        trigger: LayoutTrigger,
        metrics: ViewportMetrics,
    },
    ComposerBlurred,
    TranscriptScrolled(ScrollMetrics),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::AppStarted => "app_started",
            Self::CasesLoaded { .. } => "cases_loaded",
            Self::CaseSelected { .. } => "case_selected",
            Self::SessionStarted { .. } => "session_started",
            Self::ResetRequested => "reset_requested",
            Self::ResetResponse { .. } => "reset_response",
            Self::ChatSubmitted { .. } => "chat_submitted",
            Self::ChatResponse { .. } => "chat_response",
            Self::StageControlPressed(_) => "stage_control_pressed",
            Self::StageControlResponse { .. } => "stage_control_response",
            Self::CreateCaseRequested(_) => "create_case_requested",
            Self::CaseCreated(_) => "case_created",
            Self::ViewportChanged { .. } => "viewport_changed",
            Self::ComposerBlurred => "composer_blurred",
            Self::TranscriptScrolled(_) => "transcript_scrolled",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::CaseSelected { .. }
                | Self::ResetRequested
                | Self::ChatSubmitted { .. }
                | Self::StageControlPressed(_)
                | Self::CreateCaseRequested(_)
        )
    }

    /// Generation tag of a session-scoped response.
    #[must_use]
    pub const fn generation(&self) -> Option<u64> {
        match self {
            Self::SessionStarted { generation, .. }
            | Self::ResetResponse { generation, .. }
            | Self::ChatResponse { generation, .. }
            | Self::StageControlResponse { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}
