//! Conversation history for gemrelay.
//!
//! [`ConversationStore`] keeps one bounded transcript per
//! [`ConversationScope`](gr_domain::ConversationScope), cached in memory and
//! written through to a [`HistoryBackend`] on every mutation.

pub mod backend;
pub mod json_file;
pub mod store;

pub use backend::{HistoryBackend, MemoryBackend};
pub use json_file::JsonFileBackend;
pub use store::{ConversationStore, ResetOutcome};
