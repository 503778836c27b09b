//! URL editing core: parse a URL into fields, rebuild it from edited fields,
//! and keep a labeled, taggable history of URLs.
//!
//! Layers:
//! - domain: pure, synchronous rules (parser, rebuilder, migration, ports)
//! - usecase: history store, editor session, events
//! - infrastructure: storage adapters, serde, schema checks, config, logging
//! - interface: CLI wiring

pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod usecase;
