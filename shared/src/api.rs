//! Wire contract with the simulation backend.
//!
//! Paths, field names and stage names in this module are bit-exact with
//! what the server expects; everything else in the crate is free to change.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, ErrorKind};

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(SessionId);
typed_id!(CaseId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    ListCases,
    ListCasesPost,
    CreateCase,
    StartSession,
    ResetSession,
    PatientChat,
    AttendingOpen,
    HistoryDiscuss,
    ExamIntro,
    ExamChat,
    FinalPrompt,
    FinalCollect,
    FinalFollowups,
    StartTreatment,
    TreatmentAssess,
    FinalizeEncounter,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ListCases => "/api/cases",
            Self::ListCasesPost => "/api/cases/list",
            Self::CreateCase => "/api/cases/create",
            Self::StartSession => "/api/session/start",
            Self::ResetSession => "/api/session/reset",
            Self::PatientChat => "/api/patient/chat",
            Self::AttendingOpen => "/api/attending/open",
            Self::HistoryDiscuss => "/api/attending/history_discuss",
            Self::ExamIntro => "/api/attending/exam_intro",
            Self::ExamChat => "/api/attending/exam_chat",
            Self::FinalPrompt => "/api/attending/final_prompt",
            Self::FinalCollect => "/api/attending/final_collect",
            Self::FinalFollowups => "/api/attending/final_followups",
            Self::StartTreatment => "/api/attending/start_treatment",
            Self::TreatmentAssess => "/api/attending/treatment_assess",
            Self::FinalizeEncounter => "/api/attending/finalize_encounter",
        }
    }

    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::ListCases => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Calls whose replies belong to one session and are dropped once the
    /// session is superseded.
    #[must_use]
    pub const fn is_session_scoped(self) -> bool {
        !matches!(
            self,
            Self::ListCases | Self::ListCasesPost | Self::CreateCase
        )
    }
}

/// The identifier pair echoed on every outgoing POST body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub case_id: Option<CaseId>,
}

/// Responses that may hand the client new identifiers.
pub trait CarriesIdentifiers {
    fn identifiers(&self) -> &Identifiers;
}

/// Serializes `payload` and overwrites its `session_id` / `case_id` keys
/// with the client's current identifiers, absent ones included as `null`.
pub fn merge_identifiers<T: Serialize>(payload: &T, ids: &Identifiers) -> Result<Vec<u8>, AppError> {
    let mut value = serde_json::to_value(payload)
        .map_err(|e| AppError::new(ErrorKind::Serialization, e.to_string()))?;

    let serde_json::Value::Object(map) = &mut value else {
        return Err(AppError::new(
            ErrorKind::Serialization,
            "request payload must be a JSON object",
        ));
    };

    map.insert(
        "session_id".into(),
        ids.session_id
            .as_ref()
            .map_or(serde_json::Value::Null, |id| id.as_str().into()),
    );
    map.insert(
        "case_id".into(),
        ids.case_id
            .as_ref()
            .map_or(serde_json::Value::Null, |id| id.as_str().into()),
    );

    serde_json::to_vec(&value).map_err(|e| AppError::new(ErrorKind::Serialization, e.to_string()))
}

// --- Requests ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSessionPayload {
    pub case_id: Option<CaseId>,
}

/// A new case, sent once to `/api/cases/create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDraft {
    pub title: String,
    pub history_text: String,
    pub exam_text: String,
    pub assigned_diagnosis: String,
}

// --- Responses ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub advance_to: Option<String>,
    #[serde(flatten)]
    pub ids: Identifiers,
}

impl CarriesIdentifiers for ReplyResponse {
    fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartResponse {
    #[serde(default)]
    pub case_label: Option<String>,
    #[serde(flatten)]
    pub ids: Identifiers,
}

impl CarriesIdentifiers for SessionStartResponse {
    fn identifiers(&self) -> &Identifiers {
        &self.ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetAck {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: CaseId,
    #[serde(default, alias = "title")]
    pub label: String,
}

impl CaseSummary {
    /// Label to show, falling back to the id for unlabeled cases.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseListResponse {
    #[serde(default)]
    pub cases: Vec<CaseSummary>,
    #[serde(default)]
    pub default_case_id: Option<CaseId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    #[serde(default)]
    pub history_txt: Option<String>,
    #[serde(default)]
    pub exam_txt: Option<String>,
    #[serde(default)]
    pub history_pdf: Option<String>,
    #[serde(default)]
    pub exam_pdf: Option<String>,
}

impl DownloadLinks {
    /// `(label, url)` pairs for the links the server actually returned.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("History (.txt)", &self.history_txt),
            ("Exam (.txt)", &self.exam_txt),
            ("History (.pdf)", &self.history_pdf),
            ("Exam (.pdf)", &self.exam_pdf),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            url.as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| (label, u))
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCaseResponse {
    pub case: CaseSummary,
    #[serde(default)]
    pub downloads: DownloadLinks,
}
