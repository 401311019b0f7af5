//! Real-time event kinds shared by the messaging service and the gateway

mod realtime;

pub use realtime::RealtimeEventKind;
