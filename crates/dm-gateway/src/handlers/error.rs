//! Handler error types

use crate::protocol::CloseCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Payload did not match the op code's schema
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The connection's own outbound queue is full
    #[error("Outbound queue full")]
    QueueFull,

    /// The connection's writer task is gone
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Close code the connection is terminated with, if any
    pub fn to_close_code(&self) -> Option<CloseCode> {
        match self {
            Self::InvalidPayload(_) => Some(CloseCode::DecodeError),
            Self::QueueFull => Some(CloseCode::RateLimited),
            Self::ConnectionClosed => None,
            Self::Internal(_) => Some(CloseCode::UnknownError),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
