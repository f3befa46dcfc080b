use std::sync::Arc;

use crate::batch::BatchRunner;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<BatchRunner>,
    pub config: Config,
}
