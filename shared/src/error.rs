use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    MalformedResponse,
    StageMismatch,
    Validation,
    Serialization,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::HttpStatus => "HTTP_STATUS_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::StageMismatch => "STAGE_MISMATCH",
            Self::Validation => "VALIDATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }

    /// Whether sending the same request again could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::HttpStatus)
    }
}

/// An error that crosses the event boundary.
///
/// Every remote call resolves to `Result<T, AppError>` inside its response
/// event, so this type is plain data: serializable, cloneable, comparable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub endpoint: Option<Endpoint>,
    pub http_status: Option<u16>,
    pub context: BTreeMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: None,
            http_status: None,
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn network(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message).with_endpoint(endpoint)
    }

    #[must_use]
    pub fn malformed(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message).with_endpoint(endpoint)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn from_http_status(endpoint: Endpoint, status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ApiErrorResponse>(body)
            .ok()
            .and_then(ApiErrorResponse::into_message)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(ErrorKind::HttpStatus, message)
            .with_endpoint(endpoint)
            .with_status(status)
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Text for the `sys` transcript message that reports this error.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the simulation server. Check your connection and try again."
                    .into()
            }
            ErrorKind::HttpStatus => match self.http_status {
                Some(status) if status >= 500 => {
                    format!("The simulation server failed to respond ({status}). Please try again.")
                }
                Some(status) => format!("The request was rejected ({status}): {}", self.message),
                None => "The request was rejected by the simulation server.".into(),
            },
            ErrorKind::MalformedResponse => {
                "The simulation server sent a reply that could not be read.".into()
            }
            ErrorKind::StageMismatch => {
                format!("The encounter could not move to the requested stage: {}", self.message)
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Serialization => "Your message could not be prepared for sending.".into(),
            ErrorKind::Configuration => {
                "The app is misconfigured and cannot reach the simulation server.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(endpoint) = self.endpoint {
            write!(f, " ({})", endpoint.path())?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorResponse {
    fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}
