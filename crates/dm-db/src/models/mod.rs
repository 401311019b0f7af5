//! Database models - SQLx-compatible structs for PostgreSQL tables

mod conversation;
mod message;
mod user;

pub use conversation::{ConversationModel, ConversationPreviewModel};
pub use message::MessageModel;
pub use user::UserModel;
