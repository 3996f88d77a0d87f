//! # feedsync
//!
//! Optimistic like/hide reconciliation for social feed clients.
//!
//! When the viewer taps "like" or "hide", feedsync flips local view state
//! immediately, calls the remote authority, and then either overwrites the
//! local state with the authoritative answer or rolls it back:
//!
//! - **Instant**: the speculative mutation lands before any network I/O
//! - **Correct**: the authority's result always replaces the speculation
//! - **Safe**: failures restore the last confirmed state and reach the caller
//! - **Fenced**: overlapping taps on one post cannot apply stale responses
//!
//! ## Feature Flags
//!
//! - `memory` (default): In-memory remote authority for tests and demos
//! - `client` (default): `FeedClient` facade with session and hydration
//! - `serde` (default): Serde derives on ids, outcomes and snapshots
//!
//! ## Modules
//!
//! - [`core`]: Identifiers, gateway traits, constants and errors (always included)
//! - [`store`]: View-state store and viewer session (always included)
//! - [`reconcile`]: Optimistic interaction reconciler (always included)
//! - [`gateway`]: Gateway implementations
//! - [`client`]: High-level client (requires `client` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use feedsync::prelude::*;
//!
//! struct Backend;
//!
//! impl MutationGateway for Backend {
//!     async fn toggle_like(
//!         &self,
//!         _post_id: &PostId,
//!         viewer: &UserId,
//!     ) -> Result<LikeOutcome, InteractionError> {
//!         require_viewer(Some(viewer))?;
//!         Ok(LikeOutcome { liked: true, like_count: 1 })
//!     }
//!
//!     async fn hide_post(
//!         &self,
//!         _post_id: &PostId,
//!         viewer: &UserId,
//!     ) -> Result<HideOutcome, InteractionError> {
//!         require_viewer(Some(viewer))?;
//!         Ok(HideOutcome { hidden: true })
//!     }
//! }
//!
//! let store = ViewStateStore::new();
//! let session = ViewerSession::signed_in(UserId::from("u1"));
//! let reconciler = Reconciler::new(Backend, store.clone(), session);
//!
//! // In an async task: reconciler.toggle_like(&PostId::from("p1")).await
//! assert_eq!(reconciler.in_flight(), 0);
//! assert!(!store.is_liked(&PostId::from("p1")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// View-state store (always included)
pub mod store;

// Reconciliation layer (always included)
pub mod reconcile;

// Gateway implementations
pub mod gateway;

// Client API (feature-gated)
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::reconcile::{Phase, Reconciler, ReconcilerConfig, Settlement, StalePolicy};
    pub use crate::store::{MembershipSet, ViewState, ViewStateStore, ViewerSession};

    #[cfg(feature = "memory")]
    pub use crate::gateway::{InMemoryAuthority, InMemoryAuthorityBuilder};

    #[cfg(feature = "client")]
    pub use crate::client::{ClientConfig, FeedClient, FeedClientBuilder};
}

// Re-export commonly used items at crate root
pub use crate::core::{FeedError, InteractionError, PostId, UserId};
pub use crate::reconcile::{Reconciler, Settlement};
pub use crate::store::ViewStateStore;
