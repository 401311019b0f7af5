//! Repository traits (ports)

mod repositories;

pub use repositories::{
    ConversationRepository, MessageQuery, MessageRepository, RepoResult, UserDirectory,
};
