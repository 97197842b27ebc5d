use crate::api::{
    CaseId, CarriesIdentifiers, ChatPayload, EmptyPayload, Endpoint, HttpMethod, ReplyResponse,
    StartSessionPayload,
};
use crate::capabilities::{ApiRequest, Capabilities};
use crate::encounter::{EncounterAction, EncounterState};
use crate::error::{AppError, ErrorKind};
use crate::event::Event;
use crate::layout::{ComposerLayout, LayoutTrigger};
use crate::model::Model;
use crate::stage::{Stage, StageControl};
use crate::transcript::Role;
use crate::view::ViewModel;

#[derive(Default)]
pub struct App;

impl App {
    fn apply(model: &mut Model, action: EncounterAction) -> Result<(), AppError> {
        model.encounter = model.encounter.apply(action)?;
        Ok(())
    }

    fn append(model: &mut Model, caps: &Capabilities, text: impl Into<String>, role: Role) {
        let follow = model.should_follow(role);
        model.transcript.push(text, role);
        if follow {
            caps.viewport.scroll_to_bottom(false);
        }
    }

    fn fail(model: &mut Model, caps: &Capabilities, error: AppError) {
        let follow = model.should_follow(Role::Sys);
        model.set_error(error);
        if follow {
            caps.viewport.scroll_to_bottom(false);
        }
    }

    fn request_case_list(model: &mut Model, caps: &Capabilities, select: Option<CaseId>) {
        let endpoint = model.config.case_list_mode.endpoint();
        let request = match endpoint.method() {
            HttpMethod::Get => ApiRequest::get(&model.config, endpoint),
            HttpMethod::Post => ApiRequest::post(
                &model.config,
                endpoint,
                &EmptyPayload {},
                &model.encounter.identifiers(),
            ),
        };

        match request {
            Ok(request) => request.send(&caps.http, move |result| Event::CasesLoaded { select, result }),
            Err(e) => Self::fail(model, caps, e),
        }
    }

    /// Throws away the current encounter and asks the server for a new
    /// session scoped to `case_id`.
    fn begin_session(model: &mut Model, caps: &Capabilities, case_id: Option<CaseId>) {
        let previous = model.encounter.generation;
        if let Err(e) = Self::apply(model, EncounterAction::Begin { case_id: case_id.clone() }) {
            Self::fail(model, caps, e);
            return;
        }
        tracing::info!(
            case_id = case_id.as_ref().map_or("", CaseId::as_str),
            superseded = previous,
            generation = model.encounter.generation,
            "starting session"
        );

        model.transcript.clear();
        model.catalog.retain_downloads_for(model.encounter.case_id.as_ref());
        model.pending_replies = 0;
        model.last_error = None;

        let generation = model.encounter.generation;
        match ApiRequest::post(
            &model.config,
            Endpoint::StartSession,
            &StartSessionPayload { case_id },
            &model.encounter.identifiers(),
        ) {
            Ok(request) => request.send(&caps.http, move |result| Event::SessionStarted {
                generation,
                result,
            }),
            Err(e) => Self::fail(model, caps, e),
        }
    }

    fn welcome_message(model: &Model, case_label: Option<&str>) -> String {
        let case_id = model.encounter.case_id.as_ref();
        let label = case_label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .or_else(|| case_id.and_then(|id| model.catalog.label_for(id)))
            .or_else(|| case_id.map(CaseId::as_str))
            .unwrap_or("this case");

        format!(
            "Session started for {label}. You are speaking with the patient. Ask history questions \
             to gather HPI, PMH, meds, allergies, ROS, and social/sexual/family history. When done, \
             click \"Page Attending\"."
        )
    }

    /// Identifier adoption and `advance_to` handling shared by every reply.
    fn absorb_reply(model: &mut Model, caps: &Capabilities, reply: &ReplyResponse) {
        if let Err(e) = Self::apply(
            model,
            EncounterAction::AdoptIdentifiers(reply.identifiers().clone()),
        ) {
            Self::fail(model, caps, e);
        }

        let Some(advance_to) = reply.advance_to.as_deref().filter(|s| !s.trim().is_empty()) else {
            return;
        };
        let action = EncounterAction::ServerAdvance {
            advance_to: advance_to.to_string(),
            policy: model.config.transition_policy,
        };
        if let Err(e) = Self::apply(model, action) {
            Self::fail(model, caps, e);
        }
    }

    /// Drops replies sent under a superseded generation.
    fn is_stale(encounter: &EncounterState, event_name: &str, generation: u64) -> bool {
        if encounter.is_current(generation) {
            return false;
        }
        tracing::debug!(
            event = event_name,
            generation,
            current = encounter.generation,
            "dropping stale response"
        );
        true
    }

    /// Announces an accepted press and fetches the attending's intro.
    fn press_control(model: &mut Model, caps: &Capabilities, control: StageControl) {
        if let Some(announcement) = control.announcement() {
            Self::append(model, caps, announcement, Role::Sys);
        }

        let generation = model.encounter.generation;
        match ApiRequest::post(
            &model.config,
            control.intro_endpoint(),
            &EmptyPayload {},
            &model.encounter.identifiers(),
        ) {
            Ok(request) => {
                model.pending_replies += 1;
                request.send(&caps.http, move |result| Event::StageControlResponse {
                    generation,
                    control,
                    result,
                });
            }
            Err(e) => Self::fail(model, caps, e),
        }
    }

    fn release_reply_slot(model: &mut Model) {
        model.pending_replies = model.pending_replies.saturating_sub(1);
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let span = tracing::debug_span!("update", event = event.name());
        let _guard = span.enter();

        if event.is_user_initiated() {
            tracing::debug!(event = event.name(), stage = %model.encounter.stage, "user action");
        }
        if let Some(generation) = event.generation() {
            if Self::is_stale(&model.encounter, event.name(), generation) {
                return;
            }
        }

        match event {
            Event::Noop => {}

            Event::Configure(config) => match config.validated() {
                Ok(config) => {
                    tracing::info!(api_base = %config.api_base, "configured");
                    model.config = config;
                }
                Err(e) => Self::fail(model, caps, AppError::new(ErrorKind::Configuration, e.to_string())),
            },

            Event::AppStarted => {
                Self::request_case_list(model, caps, None);
            }

            Event::CasesLoaded { select, result } => match result {
                Ok(list) => {
                    let selected = model.catalog.replace(list, select.as_ref()).cloned();
                    tracing::info!(
                        count = model.catalog.cases().len(),
                        selected = selected.as_ref().map_or("", CaseId::as_str),
                        "case list loaded"
                    );
                    let unlisted = select.filter(|id| selected.as_ref() != Some(id));
                    let session_matches = model.encounter.session_id.is_some()
                        && model.encounter.case_id == selected;
                    if !session_matches {
                        Self::begin_session(model, caps, selected);
                    }
                    // reported after any restart so the message survives it
                    if let Some(wanted) = unlisted {
                        Self::fail(
                            model,
                            caps,
                            AppError::validation(format!("Case '{wanted}' is not in the case list yet."))
                                .with_context("case_id", wanted.as_str()),
                        );
                    }
                }
                Err(e) => Self::fail(model, caps, e),
            },

            Event::CaseSelected { case_id } => {
                if model.catalog.select(&case_id) {
                    Self::begin_session(model, caps, Some(case_id));
                } else {
                    Self::fail(
                        model,
                        caps,
                        AppError::validation(format!("Unknown case '{case_id}'."))
                            .with_context("case_id", case_id.as_str()),
                    );
                }
            }

            Event::SessionStarted { result, .. } => {
                match result {
                    Ok(started) => {
                        if let Err(e) = Self::apply(
                            model,
                            EncounterAction::AdoptIdentifiers(started.identifiers().clone()),
                        ) {
                            Self::fail(model, caps, e);
                        }
                        let welcome = Self::welcome_message(model, started.case_label.as_deref());
                        Self::append(model, caps, welcome, Role::Sys);
                    }
                    Err(e) => Self::fail(model, caps, e),
                }
            }

            Event::ResetRequested => {
                let ids = model.encounter.identifiers();
                if let Err(e) = Self::apply(model, EncounterAction::Invalidate) {
                    Self::fail(model, caps, e);
                }
                model.pending_replies = 0;

                let generation = model.encounter.generation;
                match ApiRequest::post(&model.config, Endpoint::ResetSession, &EmptyPayload {}, &ids) {
                    Ok(request) => request.send(&caps.http, move |result| Event::ResetResponse {
                        generation,
                        result,
                    }),
                    Err(e) => {
                        let case_id = model.catalog.selected().cloned();
                        Self::begin_session(model, caps, case_id);
                        Self::fail(model, caps, e);
                    }
                }
            }

            Event::ResetResponse { result, .. } => {
                let case_id = model
                    .catalog
                    .selected()
                    .cloned()
                    .or_else(|| model.encounter.case_id.clone());
                Self::begin_session(model, caps, case_id);
                if let Err(e) = result {
                    Self::fail(model, caps, e);
                }
            }

            Event::ChatSubmitted { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }

                Self::append(model, caps, text, Role::You);

                let stage = model.encounter.stage;
                let generation = model.encounter.generation;
                match ApiRequest::post(
                    &model.config,
                    stage.chat_endpoint(),
                    &ChatPayload { message: text.to_string() },
                    &model.encounter.identifiers(),
                ) {
                    Ok(request) => {
                        model.pending_replies += 1;
                        request.send(&caps.http, move |result| Event::ChatResponse {
                            generation,
                            stage,
                            result,
                        });
                    }
                    Err(e) => Self::fail(model, caps, e),
                }
            }

            Event::ChatResponse { stage, result, .. } => {
                Self::release_reply_slot(model);

                match result {
                    Ok(reply) => {
                        let role = reply
                            .role
                            .as_deref()
                            .and_then(Role::from_wire)
                            .unwrap_or_else(|| stage.default_reply_role());
                        Self::append(model, caps, reply.reply.clone(), role);

                        if stage == Stage::DxDiscuss {
                            if let Err(e) = Self::apply(model, EncounterAction::FinalCollected) {
                                Self::fail(model, caps, e);
                            }
                        }
                        Self::absorb_reply(model, caps, &reply);
                    }
                    Err(e) => Self::fail(model, caps, e),
                }
            }

            Event::StageControlPressed(control) => {
                if let Err(e) = Self::apply(model, EncounterAction::Press(control)) {
                    tracing::warn!(control = control.label(), error = %e, "control press refused");
                    Self::fail(model, caps, e);
                } else {
                    Self::press_control(model, caps, control);
                }
            }

            Event::StageControlResponse { control, result, .. } => {
                Self::release_reply_slot(model);

                match result {
                    Ok(reply) => {
                        Self::append(model, caps, reply.reply.clone(), Role::Attending);
                        Self::absorb_reply(model, caps, &reply);
                    }
                    Err(e) => Self::fail(
                        model,
                        caps,
                        e.with_context("control", control.label()),
                    ),
                }
            }

            Event::CreateCaseRequested(draft) => {
                if model.creating_case {
                    tracing::debug!("case creation already in flight");
                    return;
                }
                let request = draft.validate().and_then(|()| {
                    ApiRequest::post(
                        &model.config,
                        Endpoint::CreateCase,
                        &draft,
                        &model.encounter.identifiers(),
                    )
                });
                match request {
                    Ok(request) => {
                        model.creating_case = true;
                        request.send(&caps.http, Event::CaseCreated);
                    }
                    Err(e) => Self::fail(model, caps, e),
                }
            }

            Event::CaseCreated(result) => {
                model.creating_case = false;
                match result {
                    Ok(created) => {
                        tracing::info!(case_id = %created.case.id, "case created");
                        let case_id = created.case.id;
                        model.catalog.set_downloads(case_id.clone(), created.downloads);
                        Self::request_case_list(model, caps, Some(case_id));
                    }
                    Err(e) => Self::fail(model, caps, e),
                }
            }

            Event::ViewportChanged { trigger, metrics } => {
                if trigger == LayoutTrigger::InputFocus {
                    model.input_focused = true;
                }
                model.layout = ComposerLayout::compute(&metrics, model.config.composer_safe_inset_px);

                let sync = trigger.sync_options();
                if sync.keep_bottom || model.is_near_bottom() {
                    caps.viewport.scroll_to_bottom(sync.smooth);
                }
                if trigger.reveals_composer(model.input_focused) {
                    caps.viewport.reveal_composer();
                }
            }

            Event::ComposerBlurred => {
                model.input_focused = false;
            }

            Event::TranscriptScrolled(scroll) => {
                model.scroll = Some(scroll);
                // position only feeds the follow decision
                return;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from_model(model)
    }
}
