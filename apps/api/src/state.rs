use std::sync::Arc;

use crate::hiring::pipeline::HiringPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<HiringPipeline>,
}
