/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - The document service (store, writer locks and broadcaster)
 * - The optional operation generator
 * - The loaded server configuration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * ```rust,ignore
 * async fn handler(State(service): State<DocumentService>) {
 *     let ids = service.list();
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::collab::service::DocumentService;
use crate::backend::generation::OperationGenerator;
use crate::backend::server::config::ServerConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: DocumentService,
    /// `None` when no generator is wired in; generate requests then answer 503
    pub generator: Option<Arc<dyn OperationGenerator>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            service: DocumentService::in_memory(config.subscriber_buffer),
            generator: None,
            config: Arc::new(config),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn OperationGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("generator", &self.generator.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl FromRef<AppState> for DocumentService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.service.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
