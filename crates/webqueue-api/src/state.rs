//! Application state.

use std::sync::Arc;
use webqueue_scheduler::Scheduler;

/// Shared application state, handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }
}
