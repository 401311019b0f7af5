//! Names of the events pushed to connected clients.
//!
//! These are notifications only. Nothing here is persisted and a dropped
//! event is recovered by the client re-fetching from the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server-to-client real-time event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RealtimeEventKind {
    /// A message was persisted; sent to the recipient
    #[serde(rename = "message:new")]
    MessageNew,
    /// Delivery acknowledgment; sent to the sender's own sessions
    #[serde(rename = "message:sent")]
    MessageSent,
    /// The other participant read messages in a conversation
    #[serde(rename = "conversation:read")]
    ConversationRead,
    /// The other participant started typing
    #[serde(rename = "typing")]
    Typing,
    /// The other participant stopped typing
    #[serde(rename = "stoppedTyping")]
    StoppedTyping,
}

impl RealtimeEventKind {
    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageNew => "message:new",
            Self::MessageSent => "message:sent",
            Self::ConversationRead => "conversation:read",
            Self::Typing => "typing",
            Self::StoppedTyping => "stoppedTyping",
        }
    }
}

impl fmt::Display for RealtimeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RealtimeEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message:new" => Ok(Self::MessageNew),
            "message:sent" => Ok(Self::MessageSent),
            "conversation:read" => Ok(Self::ConversationRead),
            "typing" => Ok(Self::Typing),
            "stoppedTyping" => Ok(Self::StoppedTyping),
            other => Err(format!("unknown event: {other}")),
        }
    }
}
