#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

//! Headless core of the clinical-encounter chat client.
//!
//! A student talks to a simulated patient and attending through a fixed
//! sequence of encounter stages. This crate owns every decision (which
//! endpoint a message goes to, which control is enabled, when the stage
//! moves) and leaves rendering and I/O to a platform shell.

pub mod api;
pub mod app;
pub mod capabilities;
pub mod cases;
pub mod config;
pub mod encounter;
pub mod error;
pub mod event;
pub mod layout;
pub mod model;
pub mod stage;
pub mod transcript;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect, ViewportOperation};
pub use config::{CaseListMode, Config, ConfigError, TransitionPolicy};
pub use crux_core::{render::Render, App as CruxApp};
pub use encounter::{EncounterAction, EncounterState};
pub use error::{AppError, ErrorKind};
pub use event::Event;
pub use model::Model;
pub use stage::{Controls, Stage, StageControl, StageError, StageIndicator};
pub use transcript::{AutoScrollPolicy, ChatMessage, Role};
pub use view::ViewModel;

/// The simulation server listens here unless configured otherwise.
pub const DEFAULT_API_BASE: &str = "http://localhost:10000/";
pub const DEFAULT_NEAR_BOTTOM_THRESHOLD_PX: f64 = 56.0;
pub const DEFAULT_COMPOSER_SAFE_INSET_PX: f64 = 4.0;
