//! Entity <-> Model mappers
//!
//! Conversions that can meet corrupted rows (bad keys, unknown roles) use
//! `TryFrom` and surface a `DomainError` instead of panicking.

mod conversation;
mod message;
mod user;
