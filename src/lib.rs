//! SecuLex chat client.
//!
//! Submits questions to a question-answering backend, renders the answers
//! (plain or structured) into a transcript with provenance and copy
//! affordances, and presents the backend's learning statistics.

pub mod app;
pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod format;
pub mod message;
pub mod state;
pub mod stats;
pub mod transcript;

pub use app::{ChatApp, ClearOutcome};
pub use client::{ApiClient, AskReply};
pub use config::{Config, ConfigError};
pub use coordinator::{Coordinator, CoordinatorSettings, SubmitOutcome};
pub use error::{ClientError, StatusCategory};
pub use message::{ContentFormat, Message, Role, SourceKind};
pub use transcript::{CopyLabel, Entry, EntryId, Transcript};
