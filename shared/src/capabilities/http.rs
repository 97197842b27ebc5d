//! Request construction and response decoding on top of `crux_http`.
//!
//! The shell performs the actual I/O. This module only decides what goes
//! on the wire and how whatever comes back maps onto [`AppError`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crux_http::Http;

use crate::api::{merge_identifiers, Endpoint, HttpMethod, Identifiers};
use crate::config::Config;
use crate::error::{AppError, ErrorKind};
use crate::event::Event;

pub type HttpCapability = Http<Event>;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;
pub const MAX_RESPONSE_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub request_id: String,
}

impl ApiRequest {
    /// A JSON POST whose body is `payload` with the current identifiers
    /// merged in.
    pub fn post<T: Serialize>(
        config: &Config,
        endpoint: Endpoint,
        payload: &T,
        ids: &Identifiers,
    ) -> Result<Self, AppError> {
        let body = merge_identifiers(payload, ids).map_err(|e| e.with_endpoint(endpoint))?;
        if body.len() > MAX_REQUEST_BODY_SIZE {
            return Err(AppError::new(
                ErrorKind::Serialization,
                format!("request body of {} bytes exceeds {MAX_REQUEST_BODY_SIZE}", body.len()),
            )
            .with_endpoint(endpoint));
        }
        Ok(Self {
            body: Some(body),
            ..Self::bare(config, endpoint)?
        })
    }

    pub fn get(config: &Config, endpoint: Endpoint) -> Result<Self, AppError> {
        Self::bare(config, endpoint)
    }

    fn bare(config: &Config, endpoint: Endpoint) -> Result<Self, AppError> {
        let url = config.endpoint_url(endpoint).map_err(|e| {
            AppError::new(ErrorKind::Configuration, e.to_string()).with_endpoint(endpoint)
        })?;
        Ok(Self {
            endpoint,
            url,
            body: None,
            request_id: Uuid::new_v4().to_string(),
        })
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.endpoint.method()
    }

    /// Hands the request to the shell. `make_event` receives the decoded
    /// body or the error it decoded to.
    pub fn send<T, F>(self, http: &HttpCapability, make_event: F)
    where
        T: DeserializeOwned,
        F: FnOnce(Result<T, AppError>) -> Event + Send + 'static,
    {
        let endpoint = self.endpoint;
        tracing::debug!(
            path = endpoint.path(),
            method = self.method().as_str(),
            session_scoped = endpoint.is_session_scoped(),
            request_id = %self.request_id,
            "sending request"
        );

        let builder = match self.method() {
            HttpMethod::Get => http.get(self.url.as_str()),
            HttpMethod::Post => http.post(self.url.as_str()),
        };
        let mut builder = builder
            .header("Accept", "application/json")
            .header(REQUEST_ID_HEADER, self.request_id.as_str());
        if let Some(body) = self.body {
            builder = builder.header("Content-Type", "application/json").body(body);
        }

        builder.send(move |result| make_event(decode_http_result(endpoint, result)));
    }
}

/// Maps what the shell reported back onto the error taxonomy.
pub fn decode_http_result<T: DeserializeOwned>(
    endpoint: Endpoint,
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<T, AppError> {
    match result {
        Ok(mut response) => {
            let status = u16::from(response.status());
            let body = response.take_body().unwrap_or_default();
            decode_body(endpoint, status, &body)
        }
        Err(e) => Err(AppError::network(endpoint, e.to_string())),
    }
}

pub fn decode_body<T: DeserializeOwned>(
    endpoint: Endpoint,
    status: u16,
    body: &[u8],
) -> Result<T, AppError> {
    if !(200..300).contains(&status) {
        return Err(AppError::from_http_status(endpoint, status, body));
    }
    if body.len() > MAX_RESPONSE_BODY_SIZE {
        return Err(AppError::malformed(
            endpoint,
            format!("response body of {} bytes exceeds {MAX_RESPONSE_BODY_SIZE}", body.len()),
        ));
    }
    serde_json::from_slice(body).map_err(|e| AppError::malformed(endpoint, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CaseId, ChatPayload, ReplyResponse, ResetAck, SessionId};

    fn ids() -> Identifiers {
        Identifiers {
            session_id: Some(SessionId::new("s-1")),
            case_id: Some(CaseId::new("appendicitis")),
        }
    }

    #[test]
    fn post_targets_absolute_url_with_merged_body() {
        let request = ApiRequest::post(
            &Config::default(),
            Endpoint::PatientChat,
            &ChatPayload { message: "Any fever?".into() },
            &ids(),
        )
        .unwrap();

        assert_eq!(request.url.as_str(), "http://localhost:10000/api/patient/chat");
        assert_eq!(request.method(), HttpMethod::Post);

        let body: serde_json::Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["message"], "Any fever?");
        assert_eq!(body["session_id"], "s-1");
        assert_eq!(body["case_id"], "appendicitis");
    }

    #[test]
    fn get_has_no_body() {
        let request = ApiRequest::get(&Config::default(), Endpoint::ListCases).unwrap();
        assert_eq!(request.method(), HttpMethod::Get);
        assert!(request.body.is_none());
    }

    #[test]
    fn every_request_gets_its_own_id() {
        let a = ApiRequest::get(&Config::default(), Endpoint::ListCases).unwrap();
        let b = ApiRequest::get(&Config::default(), Endpoint::ListCases).unwrap();
        assert_ne!(a.request_id, b.request_id);
        assert!(Uuid::parse_str(&a.request_id).is_ok());
    }

    #[test]
    fn success_body_decodes() {
        let reply: ReplyResponse =
            decode_body(Endpoint::PatientChat, 200, br#"{"reply": "Since last night."}"#).unwrap();
        assert_eq!(reply.reply, "Since last night.");
    }

    #[test]
    fn error_status_carries_server_message() {
        let err = decode_body::<ResetAck>(
            Endpoint::ResetSession,
            404,
            br#"{"error": "session not found"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::HttpStatus);
        assert_eq!(err.http_status, Some(404));
        assert_eq!(err.message, "session not found");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = decode_body::<ReplyResponse>(Endpoint::ExamChat, 200, b"<html>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
        assert_eq!(err.endpoint, Some(Endpoint::ExamChat));
    }

    #[test]
    fn missing_reply_field_is_malformed() {
        let err = decode_body::<ReplyResponse>(Endpoint::ExamChat, 200, br#"{"role": "attending"}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }
}
