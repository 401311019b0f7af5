//! Data transfer objects for API requests, responses, and realtime payloads
//!
//! Field names are camelCase on the wire; ids are decimal strings.

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::SendMessageRequest;

pub use responses::{
    ConversationMessagesResponse, ConversationPreviewResponse, ConversationResponse,
    HealthResponse, MarkReadResponse, MessageEventPayload, MessageResponse, OtherUserResponse,
    ReadEventPayload, ReadinessResponse, SendMessageResponse, UnreadCountResponse,
};
