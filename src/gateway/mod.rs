//! feedsync - Gateway Implementations
//!
//! The gateway traits live in [`crate::core`]; hosted-backend client
//! libraries implement them. This module carries the in-memory authority
//! used by tests and the simulation demo.

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::*;
