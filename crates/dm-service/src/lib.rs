//! # dm-service
//!
//! Application layer: the messaging use cases, their DTOs, and the
//! [`Notifier`] seam through which realtime events leave the service.

pub mod dto;
pub mod services;

pub use dto::{
    ConversationMessagesResponse, ConversationPreviewResponse, ConversationResponse,
    HealthResponse, MarkReadResponse, MessageEventPayload, MessageResponse, OtherUserResponse,
    ReadEventPayload, ReadinessResponse, SendMessageRequest, SendMessageResponse,
    UnreadCountResponse,
};
pub use services::{
    MessagingService, NoopNotifier, Notifier, NotifyError, PgReadinessProbe, ReadinessProbe,
    RedisNotifier, RedisReadinessProbe, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult,
};
