//! Domain entities - core business objects

mod conversation;
mod message;
mod user;

pub use conversation::{Conversation, ConversationPreview};
pub use message::{validate_content, Message, MAX_CONTENT_LENGTH};
pub use user::{UserProfile, UserRole};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the microsecond precision PostgreSQL stores
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
