//! Pub/Sub channel definitions.
//!
//! Realtime events are addressed to users, never to conversations.

use dm_core::Snowflake;

/// Channel prefix for user-specific events
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Pattern matching every user channel
pub const USER_CHANNEL_PATTERN: &str = "user:*";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Events for a specific user (all their connections)
    User(Snowflake),
    /// Anything else
    Custom(String),
}

impl PubSubChannel {
    /// Create a user channel
    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if let Some(id) = name
            .strip_prefix(USER_CHANNEL_PREFIX)
            .and_then(|raw| Snowflake::parse(raw).ok())
        {
            return Self::User(id);
        }

        Self::Custom(name.to_string())
    }

    /// The addressed user, if this is a user channel
    #[must_use]
    pub fn user_id(&self) -> Option<Snowflake> {
        match self {
            Self::User(id) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
