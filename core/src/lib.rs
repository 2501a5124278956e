//! Validation and merge engine behind the habit tracker's agent tools.
//!
//! The agent issues `create_habit` / `insert_habit_data` calls; this crate
//! checks them against the user's existing habits ([`Context`]) and produces
//! the normalized mutations to persist ([`OutputDelta`]). It performs no I/O.

pub mod config;
pub mod context;
pub mod delta;
pub mod engine;
pub mod error;
pub mod input_kind;
pub mod model;
pub mod requests;
pub mod session;
pub mod timestamp;
pub mod tools;
pub mod validation;

pub use config::EngineConfig;
pub use context::Context;
pub use delta::{LoggedEntry, OutputDelta};
pub use engine::{CreationOutcome, CreationRejected, Engine, EntryOutcome, LoggingOutcome};
pub use error::{AgentError, EngineError};
pub use input_kind::InputKind;
pub use session::{Session, ToolCallResponse, ToolCallStatus};
