//! Built-in resources mounted by the server binary

mod echo;
mod status;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

pub use echo::EchoResource;
pub use status::StatusResource;

use crate::dispatch::Registry;

/// Registry holding every built-in resource
pub fn default_registry(server_name: &str, requests: &Arc<AtomicU64>) -> Registry {
    let mut registry = Registry::new();
    registry
        .mount(Arc::new(EchoResource))
        .mount(Arc::new(StatusResource::new(server_name, Arc::clone(requests))));
    registry
}
