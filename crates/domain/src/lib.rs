//! Shared types for gemrelay: conversation scopes and transcripts, the
//! error taxonomy, configuration and structured trace events.

pub mod config;
pub mod conversation;
pub mod error;
pub mod scope;
pub mod trace;

pub use conversation::{ConversationEntry, Role, Transcript, MAX_TRANSCRIPT_ENTRIES};
pub use error::{Error, Result};
pub use scope::ConversationScope;
