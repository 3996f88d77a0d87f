//! Optimistic interaction reconciler.
//!
//! Flips local state before the remote call so the UI responds instantly,
//! then overwrites it with the authoritative result or rolls it back.

use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use super::fence::SequenceFence;
use super::operation::{PendingOperation, Phase, Settlement};
use crate::core::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::core::{
    HideOutcome, InteractionError, InteractionKind, LikeOutcome, MutationGateway, PostId, UserId,
};
use crate::store::{ViewStateStore, ViewerSession};

/// What to do with a settlement that arrives after a newer invocation on
/// the same post and kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Only the latest invocation writes; stale settlements are discarded.
    #[default]
    Fence,
    /// Every settlement writes, in whatever order responses arrive.
    LastResponseWins,
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fence" => Ok(Self::Fence),
            "last-response-wins" | "last_response_wins" => Ok(Self::LastResponseWins),
            other => Err(format!("unknown stale policy: {other}")),
        }
    }
}

/// Reconciler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Overlap policy for repeated taps on the same post.
    pub stale_policy: StalePolicy,

    /// Per-request timeout. `None` leaves timeouts to the gateway transport.
    pub request_timeout: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            stale_policy: StalePolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Coordinates speculative local mutations with the remote authority.
///
/// Cloning is cheap; clones share the gateway, store, session and fence, so
/// a clone can be moved into each UI task.
///
/// # Example
///
/// ```ignore
/// let reconciler = Reconciler::new(gateway, store.clone(), session.clone());
///
/// match reconciler.toggle_like(&post_id).await {
///     Ok(settled) => render_count(settled.outcome().like_count),
///     Err(err) => show_alert(err.user_message()),
/// }
/// ```
pub struct Reconciler<G> {
    gateway: Arc<G>,
    store: ViewStateStore,
    session: ViewerSession,
    fence: Arc<Mutex<SequenceFence>>,
    config: ReconcilerConfig,
}

impl<G> Clone for Reconciler<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            store: self.store.clone(),
            session: self.session.clone(),
            fence: Arc::clone(&self.fence),
            config: self.config.clone(),
        }
    }
}

/// Whether a settling invocation may write local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Authority {
    /// Latest invocation on its key; failures roll back to `baseline`.
    Current { baseline: bool },
    /// A newer invocation on the same key owns local state.
    Stale,
    /// The viewer changed while the call was in flight.
    SessionEnded,
}

impl<G: MutationGateway> Reconciler<G> {
    /// Create a reconciler with default configuration.
    pub fn new(gateway: G, store: ViewStateStore, session: ViewerSession) -> Self {
        Self::with_config(gateway, store, session, ReconcilerConfig::default())
    }

    /// Create a reconciler with explicit configuration.
    pub fn with_config(
        gateway: G,
        store: ViewStateStore,
        session: ViewerSession,
        config: ReconcilerConfig,
    ) -> Self {
        Self::from_arc(Arc::new(gateway), store, session, config)
    }

    /// Create a reconciler sharing an existing gateway.
    pub fn from_arc(
        gateway: Arc<G>,
        store: ViewStateStore,
        session: ViewerSession,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            session,
            fence: Arc::new(Mutex::new(SequenceFence::new())),
            config,
        }
    }

    /// The store this reconciler writes to.
    pub fn store(&self) -> &ViewStateStore {
        &self.store
    }

    /// The session the acting viewer is read from.
    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    /// Active configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Number of (post, kind) keys with a remote call in flight.
    pub fn in_flight(&self) -> usize {
        self.fence().in_flight()
    }

    /// Toggle the viewer's like on `post_id`.
    ///
    /// Fails with [`InteractionError::Unauthenticated`] before touching local
    /// state when nobody is signed in. On a remote failure the like state is
    /// restored to the last membership the authority confirmed and the error
    /// is returned. Results arriving after the viewer changed are not written.
    pub async fn toggle_like(
        &self,
        post_id: &PostId,
    ) -> Result<Settlement<LikeOutcome>, InteractionError> {
        let (viewer, epoch) = self.session.require_with_epoch()?;

        let was_liked = self.store.is_liked(post_id);
        let mut op = self.begin(epoch, post_id, InteractionKind::Like, was_liked);

        self.store.apply_like_membership(post_id, !was_liked);
        op.enter(Phase::Speculative);

        let result = self.call(self.gateway.toggle_like(post_id, &viewer)).await;
        let authority = self.settle(&op, result.as_ref().ok().map(|outcome| outcome.liked));
        let seq = op.ticket.seq;

        match (result, authority) {
            (Ok(outcome), Authority::Current { .. }) => {
                self.store.apply_like_membership(post_id, outcome.liked);
                self.store.set_like_count(post_id, outcome.like_count);
                op.enter(Phase::Reconciled);
                Ok(Settlement::Reconciled(outcome))
            }
            (Ok(outcome), authority) => {
                op.enter(Phase::Superseded);
                debug!(post_id = %post_id, seq, ?authority, "discarded like result");
                Ok(Settlement::Superseded(outcome))
            }
            (Err(err), Authority::Current { baseline }) => {
                self.store.apply_like_membership(post_id, baseline);
                op.enter(Phase::RolledBack);
                warn!(post_id = %post_id, seq, error = %err, "like rolled back");
                Err(err)
            }
            (Err(err), authority) => {
                op.enter(Phase::Superseded);
                warn!(post_id = %post_id, seq, ?authority, error = %err, "superseded like failed");
                Err(err)
            }
        }
    }

    /// Hide `post_id`, authored by `author_id`, from the viewer's feed.
    ///
    /// Hiding your own post fails with
    /// [`InteractionError::SelfActionForbidden`] before touching local state.
    /// The speculative flip only happens if the post was not already hidden.
    /// On failure the post is unhidden only if the authority never confirmed
    /// it hidden.
    pub async fn hide_post(
        &self,
        post_id: &PostId,
        author_id: &UserId,
    ) -> Result<Settlement<HideOutcome>, InteractionError> {
        let (viewer, epoch) = self.session.require_with_epoch()?;
        if &viewer == author_id {
            return Err(InteractionError::SelfActionForbidden {
                post_id: post_id.clone(),
            });
        }

        let was_hidden = self.store.is_hidden(post_id);
        let mut op = self.begin(epoch, post_id, InteractionKind::Hide, was_hidden);

        if !was_hidden {
            self.store.apply_hidden_membership(post_id, true);
        }
        op.enter(Phase::Speculative);

        let result = self.call(self.gateway.hide_post(post_id, &viewer)).await;
        let authority = self.settle(&op, result.as_ref().ok().map(|outcome| outcome.hidden));
        let seq = op.ticket.seq;

        match (result, authority) {
            (Ok(outcome), Authority::Current { .. }) => {
                self.store.apply_hidden_membership(post_id, outcome.hidden);
                op.enter(Phase::Reconciled);
                Ok(Settlement::Reconciled(outcome))
            }
            (Ok(outcome), authority) => {
                op.enter(Phase::Superseded);
                debug!(post_id = %post_id, seq, ?authority, "discarded hide result");
                Ok(Settlement::Superseded(outcome))
            }
            (Err(err), Authority::Current { baseline }) => {
                if !baseline {
                    self.store.remove_hidden(post_id);
                }
                op.enter(Phase::RolledBack);
                warn!(post_id = %post_id, seq, error = %err, "hide rolled back");
                Err(err)
            }
            (Err(err), authority) => {
                op.enter(Phase::Superseded);
                warn!(post_id = %post_id, seq, ?authority, error = %err, "superseded hide failed");
                Err(err)
            }
        }
    }

    fn begin(
        &self,
        epoch: u64,
        post_id: &PostId,
        kind: InteractionKind,
        was_active: bool,
    ) -> PendingOperation {
        let ticket = self.fence().begin(epoch, post_id, kind, was_active);
        PendingOperation::new(post_id.clone(), kind, was_active, ticket)
    }

    /// Settle `op` with the fence, recording `confirmed` membership on success.
    fn settle(&self, op: &PendingOperation, confirmed: Option<bool>) -> Authority {
        let mut fence = self.fence();
        if self.session.epoch() != op.ticket.epoch {
            // Release the key without recording anything for the new viewer
            fence.settle(&op.post_id, op.kind, op.ticket, None);
            return Authority::SessionEnded;
        }

        match fence.settle(&op.post_id, op.kind, op.ticket, confirmed) {
            Some(baseline) => Authority::Current { baseline },
            None if self.config.stale_policy == StalePolicy::LastResponseWins => {
                Authority::Current {
                    baseline: op.was_active,
                }
            }
            None => Authority::Stale,
        }
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, InteractionError>>,
    ) -> Result<T, InteractionError> {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| {
                InteractionError::Network(format!("request timed out after {limit:?}"))
            })?,
            None => request.await,
        }
    }

    fn fence(&self) -> MutexGuard<'_, SequenceFence> {
        // Fence updates cannot leave it half-written, so a poisoned lock is still usable
        self.fence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
