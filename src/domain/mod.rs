//! Domain layer: pure, synchronous rules. No IO, no logging.

pub mod error;
pub mod migration;
pub mod model;
pub mod traits;
pub mod url_parser;
pub mod url_rebuilder;
