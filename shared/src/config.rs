use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::api::Endpoint;
use crate::transcript::AutoScrollPolicy;
use crate::{DEFAULT_API_BASE, DEFAULT_COMPOSER_SAFE_INSET_PX, DEFAULT_NEAR_BOTTOM_THRESHOLD_PX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseListMode {
    /// `GET /api/cases`
    #[default]
    Get,
    /// `POST /api/cases/list`
    Post,
}

impl CaseListMode {
    #[must_use]
    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Get => Endpoint::ListCases,
            Self::Post => Endpoint::ListCasesPost,
        }
    }
}

/// How far to trust a server-directed `advance_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Adopt any known stage, legal successor or not.
    #[default]
    Trusted,
    /// Reject stages that are not a legal successor of the current one.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(String),
    #[error("api_base is not a valid URL: {0}")]
    InvalidBase(String),
    #[error("api_base must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("api_base must have a host")]
    MissingHost,
    #[error("{field} must be a finite, non-negative number")]
    InvalidNumber { field: &'static str },
    #[error("cannot build URL for {path}: {reason}")]
    Endpoint { path: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute http(s) base, normalized to end in `/` by [`Config::validated`].
    pub api_base: String,
    pub case_list_mode: CaseListMode,
    pub auto_scroll: AutoScrollPolicy,
    pub transition_policy: TransitionPolicy,
    pub near_bottom_threshold_px: f64,
    pub composer_safe_inset_px: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            case_list_mode: CaseListMode::default(),
            auto_scroll: AutoScrollPolicy::default(),
            transition_policy: TransitionPolicy::default(),
            near_bottom_threshold_px: DEFAULT_NEAR_BOTTOM_THRESHOLD_PX,
            composer_safe_inset_px: DEFAULT_COMPOSER_SAFE_INSET_PX,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Checks the config and normalizes `api_base` to end in `/`, so that
    /// a base such as `https://host/sim` keeps its path prefix when
    /// endpoints are joined onto it.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let mut base = self.base_url()?;
        let scheme = base.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        }
        if base.host_str().is_none() {
            return Err(ConfigError::MissingHost);
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.api_base = base.into();

        for (field, value) in [
            ("near_bottom_threshold_px", self.near_bottom_threshold_px),
            ("composer_safe_inset_px", self.composer_safe_inset_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field });
            }
        }

        Ok(self)
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base).map_err(|e| ConfigError::InvalidBase(e.to_string()))
    }

    /// Absolute URL for `endpoint` under `api_base`.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ConfigError> {
        let path = endpoint.path();
        self.base_url()?
            .join(path.trim_start_matches('/'))
            .map_err(|e| ConfigError::Endpoint {
                path,
                reason: e.to_string(),
            })
    }
}
