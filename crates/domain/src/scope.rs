use std::fmt;

/// Isolation boundary for a transcript.
///
/// A shared space (e.g. a server) and a private one-to-one conversation
/// are distinct even when their numeric ids collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationScope {
    /// A multi-user space, keyed by space id.
    Shared(u64),
    /// A one-to-one space, keyed by user id.
    Private(u64),
}

impl ConversationScope {
    /// Resolve the scope of an inbound request: requests without a space
    /// come from a private conversation with the user.
    pub fn resolve(space_id: Option<u64>, user_id: u64) -> Self {
        match space_id {
            Some(id) => ConversationScope::Shared(id),
            None => ConversationScope::Private(user_id),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ConversationScope::Shared(id) | ConversationScope::Private(id) => *id,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ConversationScope::Private(_))
    }
}

impl fmt::Display for ConversationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationScope::Shared(id) => write!(f, "shared:{id}"),
            ConversationScope::Private(id) => write!(f, "private:{id}"),
        }
    }
}
