use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "URL_EDITOR_LOG";

/// Install the global subscriber. Logs go to stderr; stdout is reserved for
/// command output. Calling it twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
