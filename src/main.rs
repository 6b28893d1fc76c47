use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use restgate::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use restgate::{logger, resources, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime, worker count from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let requests = Arc::new(AtomicU64::new(0));
    let registry = resources::default_registry(&cfg.http.server_name, &requests);
    let state = Arc::new(AppState::with_counter(cfg, registry, requests));

    runtime.block_on(server::run(state))
}
