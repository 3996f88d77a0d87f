//! feedsync - Client Library
//!
//! High-level API tying session, store and reconciler to one authority.

#[allow(clippy::module_inception)]
mod client;

pub use client::*;
