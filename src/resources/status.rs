//! `status` resource: service name, version, uptime and request count

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde_json::json;

use crate::dispatch::{Call, HandlerResult, MethodFilter, Operation, Resource};

pub struct StatusResource {
    name: String,
    started_at: DateTime<Local>,
    requests: Arc<AtomicU64>,
}

impl StatusResource {
    pub fn new(name: impl Into<String>, requests: Arc<AtomicU64>) -> Self {
        Self {
            name: name.into(),
            started_at: Local::now(),
            requests,
        }
    }

    fn report(&self, _call: &Call<'_>) -> HandlerResult {
        let uptime = Local::now().signed_duration_since(self.started_at);
        Ok(json!({
            "name": self.name,
            "version": env!("CARGO_PKG_VERSION"),
            "started_at": self.started_at.to_rfc3339(),
            "uptime_secs": uptime.num_seconds().max(0),
            "requests": self.requests.load(Ordering::Relaxed),
        }))
    }
}

impl Resource for StatusResource {
    fn endpoint(&self) -> &str {
        "status"
    }

    fn operations(self: Arc<Self>) -> Vec<Operation> {
        vec![Operation::new("", MethodFilter::GET, move |call| {
            self.report(call)
        })]
    }
}
