use std::sync::Arc;

use crate::config::Config;
use crate::registrations::service::RegistrationService;
use crate::store::RegistrationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub registrations: RegistrationService,
    /// Name of the active store backend, reported by `/health`.
    pub store_backend: &'static str,
}

impl AppState {
    pub fn new(store: Arc<dyn RegistrationStore>, store_backend: &'static str, config: &Config) -> Self {
        Self {
            registrations: RegistrationService::new(store)
                .with_known_ids_on_miss(config.not_found_lists_known_ids),
            store_backend,
        }
    }
}
