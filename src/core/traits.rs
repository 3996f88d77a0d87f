//! Core traits for feedsync.
//!
//! These traits are the seam to the remote authority. The hosted backend's
//! client library implements them; the reconciler only sees the traits.

use std::future::Future;

use super::error::InteractionError;
use super::types::{HideOutcome, LikeOutcome, PostId, UserId, ViewerSnapshot};

/// The two authoritative state-changing calls against the remote backend.
///
/// # Requirements
///
/// - Implementations MUST reject an empty viewer with
///   [`InteractionError::Unauthenticated`] before performing any I/O
///   (see [`require_viewer`](super::require_viewer)).
/// - `toggle_like` MUST decide the new state from the existing like record
///   and report the authoritative like total, not a local guess.
/// - `hide_post` MUST reject hiding the viewer's own post with
///   [`InteractionError::SelfActionForbidden`] and MUST be idempotent.
///
/// # Example
///
/// ```ignore
/// struct Backend { /* hosted client handle */ }
///
/// impl MutationGateway for Backend {
///     async fn toggle_like(&self, post_id: &PostId, viewer: &UserId)
///         -> Result<LikeOutcome, InteractionError>
///     {
///         require_viewer(Some(viewer))?;
///         self.call("posts:toggleLike", post_id, viewer).await
///     }
///
///     async fn hide_post(&self, post_id: &PostId, viewer: &UserId)
///         -> Result<HideOutcome, InteractionError>
///     {
///         require_viewer(Some(viewer))?;
///         self.call("posts:hide", post_id, viewer).await
///     }
/// }
/// ```
pub trait MutationGateway: Send + Sync + 'static {
    /// Toggle the viewer's like on a post.
    fn toggle_like(
        &self,
        post_id: &PostId,
        viewer: &UserId,
    ) -> impl Future<Output = Result<LikeOutcome, InteractionError>> + Send;

    /// Hide a post from the viewer's feed.
    fn hide_post(
        &self,
        post_id: &PostId,
        viewer: &UserId,
    ) -> impl Future<Output = Result<HideOutcome, InteractionError>> + Send;
}

/// Bulk read of the viewer's current interaction state.
///
/// Used once per session to hydrate the view-state store.
pub trait HydrationSource: Send + Sync + 'static {
    /// Fetch the viewer's like set, hidden set and like totals.
    fn fetch_snapshot(
        &self,
        viewer: &UserId,
    ) -> impl Future<Output = Result<ViewerSnapshot, InteractionError>> + Send;
}
