//! Application state shared by every handler

use std::sync::Arc;

use dm_common::{AppConfig, JwtService};
use dm_service::{MessagingService, ServiceContext};

#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(service_context: ServiceContext, config: AppConfig) -> Self {
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Messaging use cases bound to this state's context
    pub fn messaging(&self) -> MessagingService<'_> {
        MessagingService::new(&self.service_context)
    }

    /// Credential verifier for the `Authorization` header
    pub fn jwt_service(&self) -> &JwtService {
        self.service_context.jwt_service()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.config.api.address())
            .field("env", &self.config.app.env)
            .finish_non_exhaustive()
    }
}
