//! Value objects - immutable types that represent domain concepts

mod participants_key;
mod snowflake;

pub use participants_key::ParticipantsKey;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
