//! # warden-config
//!
//! Configuration for the Warden governance engine — a TOML schema with
//! defaults for every threshold the engine consults, plus a loader with
//! environment-variable overrides.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::WardenConfig;
