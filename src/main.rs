//! Binary entrypoint.
//!
//! The crate is split into Clean Architecture layers:
//! - domain: pure, synchronous rules
//! - usecase: history store, editor session, events
//! - infrastructure: serde + file IO + implementations of ports
//! - interface: CLI wiring

use anyhow::Result;
use url_editor::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    url_editor::interface::cli::run().await
}
