#![allow(dead_code)]

use crux_core::testing::AppTester;
use serde_json::Value;

use encounter_shared::api::{
    CaseId, CaseListResponse, CaseSummary, Identifiers, ReplyResponse, SessionId,
    SessionStartResponse,
};
use encounter_shared::{App, Effect, Event, Model, ViewportOperation};

pub type Tester = AppTester<App, Effect>;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
    pub method: String,
    pub url: String,
    pub body: Value,
}

impl HttpCall {
    pub fn path(&self) -> &str {
        self.url.trim_start_matches("http://localhost:10000")
    }
}

pub fn http_calls(effects: &[Effect]) -> Vec<HttpCall> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => {
                let op = &request.operation;
                let body = if op.body.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&op.body).expect("request body is JSON")
                };
                Some(HttpCall {
                    method: op.method.clone(),
                    url: op.url.clone(),
                    body,
                })
            }
            _ => None,
        })
        .collect()
}

pub fn single_call(effects: &[Effect]) -> HttpCall {
    let mut calls = http_calls(effects);
    assert_eq!(calls.len(), 1, "expected exactly one HTTP call, got {calls:?}");
    calls.remove(0)
}

pub fn viewport_ops(effects: &[Effect]) -> Vec<ViewportOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Viewport(request) => Some(request.operation),
            _ => None,
        })
        .collect()
}

pub fn renders(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

pub fn case_list() -> CaseListResponse {
    CaseListResponse {
        cases: vec![
            CaseSummary { id: CaseId::new("appendicitis"), label: "Acute appendicitis".into() },
            CaseSummary { id: CaseId::new("asthma"), label: "Asthma exacerbation".into() },
        ],
        default_case_id: Some(CaseId::new("appendicitis")),
    }
}

pub fn reply(text: &str) -> ReplyResponse {
    ReplyResponse {
        reply: text.into(),
        role: None,
        advance_to: None,
        ids: Identifiers::default(),
    }
}

pub fn reply_advancing(text: &str, advance_to: &str) -> ReplyResponse {
    ReplyResponse {
        advance_to: Some(advance_to.into()),
        ..reply(text)
    }
}

/// Boots the app and completes the session handshake for `appendicitis`.
pub fn started_session(app: &Tester) -> Model {
    let mut model = Model::default();
    app.update(Event::AppStarted, &mut model);
    app.update(
        Event::CasesLoaded { select: None, result: Ok(case_list()) },
        &mut model,
    );
    let generation = model.encounter.generation;
    app.update(
        Event::SessionStarted {
            generation,
            result: Ok(SessionStartResponse {
                case_label: Some("Acute appendicitis".into()),
                ids: Identifiers {
                    session_id: Some(SessionId::new("s-1")),
                    case_id: Some(CaseId::new("appendicitis")),
                },
            }),
        },
        &mut model,
    );
    model
}

pub fn last_text(model: &Model) -> &str {
    model.transcript.last().map_or("", |m| m.text.as_str())
}
