//! Gateway protocol definitions
//!
//! Op codes, frame envelope, payloads and close codes.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::{GatewayMessage, READY_EVENT};
pub use opcodes::OpCode;
pub use payloads::{HelloPayload, ReadyPayload, TypingEventPayload, TypingPayload};
