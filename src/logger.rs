use std::env;
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `log` records from the library are bridged in.
///
/// `RUST_LOG` wins over `LOG_LEVEL`; without either only warnings are shown
/// so the prompts stay readable.
pub fn init_logging() {
    let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "WARN".to_string());
    let level = level.to_lowercase();

    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => EnvFilter::new(level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
