use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::stage::{Stage, StageControl, StageIndicator};
use crate::transcript::Role;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlView {
    pub control: StageControl,
    pub element_id: String,
    pub label: String,
    pub enabled: bool,
    /// Carries the active-stage highlight.
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageView {
    pub text: String,
    pub role: Role,
    pub css_class: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadView {
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CssVariable {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub stage: Stage,
    pub stage_label: String,
    pub indicator: StageIndicator,
    pub active_element_id: String,
    pub history_active: bool,
    pub controls: Vec<ControlView>,
    pub messages: Vec<MessageView>,
    pub cases: Vec<CaseOption>,
    pub cases_loaded: bool,
    pub downloads: Vec<DownloadView>,
    pub css_variables: Vec<CssVariable>,
    pub keyboard_open: bool,
    pub awaiting_reply: bool,
    pub creating_case: bool,
    pub session_active: bool,
}

impl ViewModel {
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let encounter = &model.encounter;
        let indicator = encounter.stage.indicator();

        let controls = StageControl::ALL
            .into_iter()
            .map(|control| ControlView {
                control,
                element_id: control.element_id().to_string(),
                label: control.label().to_string(),
                enabled: encounter.controls.is_enabled(control),
                active: indicator == StageIndicator::Control(control),
            })
            .collect();

        let messages = model
            .transcript
            .iter()
            .map(|m| MessageView {
                text: m.text.clone(),
                role: m.role,
                css_class: format!("msg {}", m.role.css_class()),
            })
            .collect();

        let selected = model.catalog.selected();
        let cases = model
            .catalog
            .cases()
            .iter()
            .map(|c| CaseOption {
                id: c.id.to_string(),
                label: c.display_label().to_string(),
                selected: selected == Some(&c.id),
            })
            .collect();

        // server links are usually relative to the API host
        let base = model.config.base_url().ok();
        let downloads = model
            .catalog
            .downloads()
            .map(|links| {
                links
                    .entries()
                    .into_iter()
                    .map(|(label, url)| DownloadView {
                        label: label.to_string(),
                        url: base
                            .as_ref()
                            .and_then(|base| base.join(url).ok())
                            .map_or_else(|| url.to_string(), String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let css_variables = model
            .layout
            .css_variables()
            .into_iter()
            .map(|(name, value)| CssVariable { name: name.to_string(), value })
            .collect();

        Self {
            stage: encounter.stage,
            stage_label: encounter.stage.display_name().to_string(),
            indicator,
            active_element_id: indicator.element_id().to_string(),
            history_active: indicator == StageIndicator::History,
            controls,
            messages,
            cases,
            cases_loaded: model.catalog.is_loaded(),
            downloads,
            css_variables,
            keyboard_open: model.layout.keyboard_open(),
            awaiting_reply: model.pending_replies > 0,
            creating_case: model.creating_case,
            session_active: encounter.session_id.is_some(),
        }
    }
}
