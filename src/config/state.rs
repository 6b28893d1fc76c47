// Application state module
// Everything shared between connections; immutable apart from counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::Config;
use crate::dispatch::{DispatchOptions, Registry};

/// Application state
pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub dispatch: DispatchOptions,

    /// Requests handled since start-up, shared with the status resource
    pub requests: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, registry: Registry) -> Self {
        Self::with_counter(config, registry, Arc::new(AtomicU64::new(0)))
    }

    /// Build state around an existing request counter
    pub fn with_counter(config: Config, registry: Registry, requests: Arc<AtomicU64>) -> Self {
        let dispatch = config.dispatch_options();
        Self {
            config,
            registry,
            dispatch,
            requests,
        }
    }

    pub fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }
}
