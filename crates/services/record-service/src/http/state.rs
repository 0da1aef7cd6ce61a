//! Application state for dependency injection.

use std::sync::Arc;
use std::time::Duration;

use common::CallContext;

use crate::service::RecordService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordService>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Create new app state.
    pub fn new(records: Arc<dyn RecordService>, request_timeout: Duration) -> Self {
        Self {
            records,
            request_timeout,
        }
    }

    /// Context for one request, bound to the current request span.
    pub fn call_context(&self) -> CallContext {
        CallContext::new().with_timeout(self.request_timeout)
    }
}
