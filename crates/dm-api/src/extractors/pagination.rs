//! Pagination extractor
//!
//! Cursor pagination for message pages: `?before=<id>`, `?after=<id>`,
//! `?limit=<n>`. Both cursors together select the window between them.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use dm_core::traits::MessageQuery;
use dm_core::Snowflake;
use serde::Deserialize;

use crate::response::ApiError;

/// Raw pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// Validated pagination parameters
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    /// Clamped to `1..=MessageQuery::MAX_LIMIT`
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            limit: MessageQuery::DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Create pagination with only a limit
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit: limit.clamp(1, MessageQuery::MAX_LIMIT),
            ..Self::default()
        }
    }

    /// Store-level query for this page
    pub fn to_query(&self) -> MessageQuery {
        MessageQuery {
            before: self.before,
            after: self.after,
            limit: self.limit,
        }
    }
}

fn parse_cursor(raw: Option<String>, name: &str) -> Result<Option<Snowflake>, ApiError> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Snowflake>()
                .map_err(|_| ApiError::invalid_query(format!("Invalid '{name}' cursor format")))
        })
        .transpose()
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = ApiError;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        let before = parse_cursor(params.before, "before")?;
        let after = parse_cursor(params.after, "after")?;

        let limit = match params.limit.filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ApiError::invalid_query("'limit' must be an integer"))?
                .clamp(1, MessageQuery::MAX_LIMIT),
            None => MessageQuery::DEFAULT_LIMIT,
        };

        Ok(Pagination {
            before,
            after,
            limit,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.to_string()))?;

        Pagination::try_from(params)
    }
}
