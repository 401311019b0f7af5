//! # dm-core
//!
//! Domain layer for direct messaging: conversations between two participants,
//! append-only messages, repository traits (ports), and real-time event kinds.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    validate_content, Conversation, ConversationPreview, Message, UserProfile, UserRole,
    MAX_CONTENT_LENGTH,
};
pub use error::DomainError;
pub use events::RealtimeEventKind;
pub use traits::{
    ConversationRepository, MessageQuery, MessageRepository, RepoResult, UserDirectory,
};
pub use value_objects::{ParticipantsKey, Snowflake, SnowflakeGenerator, SnowflakeParseError};
