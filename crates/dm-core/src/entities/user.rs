//! User profile - read-only reference data owned by the identity provider

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Platform role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Seeker,
    Recruiter,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeker => "seeker",
            Self::Recruiter => "recruiter",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seeker" => Ok(Self::Seeker),
            "recruiter" => Ok(Self::Recruiter),
            other => Err(DomainError::ValidationError(format!("unknown role: {other}"))),
        }
    }
}

/// What messaging needs to know about a user: who they are and how to show them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Snowflake,
    pub display_name: String,
    pub avatar_ref: Option<String>,
    pub role: UserRole,
}

impl UserProfile {
    pub fn new(id: Snowflake, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_ref: None,
            role,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }

    #[inline]
    pub fn is_recruiter(&self) -> bool {
        self.role == UserRole::Recruiter
    }
}
