//! Request DTOs for API endpoints

use dm_core::{Snowflake, MAX_CONTENT_LENGTH};
use serde::Deserialize;
use validator::Validate;

/// Send a direct message to another user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Recipient user id
    pub to: Snowflake,

    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,
}

// The validator attribute needs a literal; keep it in step with the domain rule.
const _: () = assert!(MAX_CONTENT_LENGTH == 1000);
