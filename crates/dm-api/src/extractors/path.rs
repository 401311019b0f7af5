//! Path parameter extractors
//!
//! Type-safe extraction of Snowflake IDs from path parameters.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use dm_core::Snowflake;
use serde::de::DeserializeOwned;

use crate::response::ApiError;

/// Path extractor whose rejection is an `INVALID_PATH` API error
#[derive(Debug, Clone)]
pub struct SnowflakePath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for SnowflakePath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_path(e.to_string()))?;

        Ok(SnowflakePath(inner))
    }
}

fn parse_id(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// Path parameters with conversation_id
#[derive(Debug, serde::Deserialize)]
pub struct ConversationIdPath {
    pub conversation_id: String,
}

impl ConversationIdPath {
    pub fn conversation_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.conversation_id, "conversation_id")
    }
}

/// Path parameters with other_user_id
#[derive(Debug, serde::Deserialize)]
pub struct OtherUserIdPath {
    pub other_user_id: String,
}

impl OtherUserIdPath {
    pub fn other_user_id(&self) -> Result<Snowflake, ApiError> {
        parse_id(&self.other_user_id, "other_user_id")
    }
}
