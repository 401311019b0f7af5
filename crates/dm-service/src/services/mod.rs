//! Business logic services
//!
//! The messaging service is the only mutation entry point into the store.

pub mod context;
pub mod error;
pub mod health;
pub mod messaging;
pub mod notifier;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use health::{PgReadinessProbe, ReadinessProbe, RedisReadinessProbe};
pub use messaging::MessagingService;
pub use notifier::{NoopNotifier, Notifier, NotifyError, RedisNotifier};
