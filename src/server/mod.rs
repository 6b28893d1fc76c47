// Server module entry point
// Listener setup, connection handling and shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::Notify;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;

use crate::config::AppState;
use crate::logger;

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_reusable_listener(addr, state.config.performance.backlog)?;

    if state.registry.is_empty() {
        logger::log_warning("No operations mounted, every request will be answered 404");
    }
    logger::log_server_start(&addr, &state.config, &state.registry.names());

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    start_server_loop(listener, state, Arc::new(AtomicUsize::new(0)), shutdown).await
}
