use std::sync::Arc;

use crate::services::{engine::JobEngine, scheduler::Scheduler};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<JobEngine>,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(engine: Arc<JobEngine>, max_concurrency: Option<usize>) -> Self {
        Self {
            scheduler: Scheduler::new(engine.clone(), max_concurrency),
            engine,
        }
    }
}
