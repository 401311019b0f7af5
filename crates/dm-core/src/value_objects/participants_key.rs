//! Participants key - canonical identity of an unordered user pair
//!
//! The key is the two user ids sorted ascending and joined with `_`,
//! so `(A, B)` and `(B, A)` always map to the same key. The store puts a
//! unique constraint on it, which is what limits a pair to one conversation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Snowflake;
use crate::error::DomainError;

const SEPARATOR: char = '_';

/// Canonical key for a two-participant conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantsKey {
    low: Snowflake,
    high: Snowflake,
}

impl ParticipantsKey {
    /// Build the key for a pair of distinct users, in either order
    pub fn new(a: Snowflake, b: Snowflake) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::SelfConversation);
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    /// Smaller participant id
    #[inline]
    pub fn low(&self) -> Snowflake {
        self.low
    }

    /// Larger participant id
    #[inline]
    pub fn high(&self) -> Snowflake {
        self.high
    }

    /// Both participants, smaller id first
    #[inline]
    pub fn participants(&self) -> [Snowflake; 2] {
        [self.low, self.high]
    }

    #[inline]
    pub fn contains(&self, user_id: Snowflake) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is one of the pair
    pub fn other(&self, user_id: Snowflake) -> Option<Snowflake> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Parse a stored key back into its participants
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::ValidationError(format!("invalid participants key: {s}"));

        let (a, b) = s.split_once(SEPARATOR).ok_or_else(invalid)?;
        let a = Snowflake::parse(a).map_err(|_| invalid())?;
        let b = Snowflake::parse(b).map_err(|_| invalid())?;
        let key = Self::new(a, b)?;

        // Only the canonical ordering is a valid stored key
        if key.low != a {
            return Err(invalid());
        }
        Ok(key)
    }
}

impl fmt::Display for ParticipantsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.low, self.high)
    }
}

impl From<ParticipantsKey> for String {
    fn from(key: ParticipantsKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ParticipantsKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}
