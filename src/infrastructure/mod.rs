// Infrastructure layer: adapters, file I/O, serde, eventing
pub mod config;
pub mod event_ndjson;
pub mod file_store;
pub mod id_generator;
pub mod logging;
pub mod memory_store;
pub mod schema_validator;
pub mod serde_json_adapter;
