//! # warden-core
//!
//! Core types, errors, and events for the Warden governance engine.
//! This crate defines the shared vocabulary used by every other crate in the
//! workspace.

pub mod error;
pub mod event;
pub mod types;

pub use error::{Result, WardenError};
pub use event::{EventBus, GovernanceEvent};
pub use types::*;
