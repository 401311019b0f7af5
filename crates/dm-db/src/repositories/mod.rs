//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in dm-core.

mod conversation;
mod error;
mod message;
mod user_directory;

pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use user_directory::PgUserDirectory;
