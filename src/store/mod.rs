//! feedsync - View-State Store
//!
//! Implements:
//! - Boolean membership sets for liked and hidden posts
//! - Idempotent single-post apply, full-replace hydration
//! - Synchronous change notification to subscribed observers
//! - The signed-in viewer as an observable session handle

mod membership;
mod session;
mod view;

pub use membership::*;
pub use session::*;
pub use view::*;
