//! High-level feed client API.
//!
//! Provides `FeedClient<G>` wiring the viewer session, view-state store and
//! reconciler to one remote authority `G`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::core::constants::{ENV_REQUEST_TIMEOUT_MS, ENV_STALE_POLICY};
use crate::core::{
    FeedError, HideOutcome, HydrationSource, InteractionError, LikeOutcome, MutationGateway,
    PostId, UserId, require_viewer,
};
use crate::reconcile::{Reconciler, ReconcilerConfig, Settlement, StalePolicy};
use crate::store::{ViewStateStore, ViewerSession};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Reconciler settings.
    pub reconciler: ReconcilerConfig,

    /// Fetch the viewer's snapshot as part of sign-in.
    pub hydrate_on_sign_in: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            hydrate_on_sign_in: true,
        }
    }
}

impl ClientConfig {
    /// Read overrides from the process environment.
    ///
    /// - `FEEDSYNC_STALE_POLICY`: `fence` or `last-response-wins`
    /// - `FEEDSYNC_REQUEST_TIMEOUT_MS`: milliseconds, `0` disables
    pub fn from_env() -> Result<Self, FeedError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FeedError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_STALE_POLICY) {
            config.reconciler.stale_policy = raw
                .parse::<StalePolicy>()
                .map_err(|e| FeedError::Config(format!("{ENV_STALE_POLICY}: {e}")))?;
        }

        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|e| {
                FeedError::Config(format!("{ENV_REQUEST_TIMEOUT_MS}: invalid value {raw:?}: {e}"))
            })?;
            config.reconciler.request_timeout =
                (millis > 0).then(|| Duration::from_millis(millis));
        }

        Ok(config)
    }
}

/// Builder for creating a `FeedClient` around a remote authority.
#[derive(Debug)]
pub struct FeedClientBuilder<G> {
    gateway: G,
    config: ClientConfig,
}

impl<G> FeedClientBuilder<G> {
    /// Create a builder for a client talking to `gateway`.
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the overlap policy.
    pub fn stale_policy(mut self, policy: StalePolicy) -> Self {
        self.config.reconciler.stale_policy = policy;
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.reconciler.request_timeout = Some(timeout);
        self
    }

    /// Enable or disable hydration on sign-in.
    pub fn hydrate_on_sign_in(mut self, enabled: bool) -> Self {
        self.config.hydrate_on_sign_in = enabled;
        self
    }

    /// Build the client.
    pub fn build(self) -> FeedClient<G>
    where
        G: MutationGateway + HydrationSource,
    {
        FeedClient::with_config(self.gateway, self.config)
    }
}

/// A feed client.
///
/// Generic over the remote authority `G`, which must implement both
/// [`MutationGateway`] and [`HydrationSource`].
///
/// # Example
///
/// ```ignore
/// use feedsync::client::FeedClient;
///
/// let client = FeedClient::builder(backend)
///     .request_timeout(Duration::from_secs(5))
///     .build();
///
/// client.sign_in(UserId::from("u2")).await?;
/// client.toggle_like(&PostId::from("p7")).await?;
/// assert!(client.store().is_liked(&PostId::from("p7")));
/// ```
pub struct FeedClient<G> {
    gateway: Arc<G>,
    store: ViewStateStore,
    session: ViewerSession,
    reconciler: Reconciler<G>,
    config: ClientConfig,
}

impl<G> FeedClient<G>
where
    G: MutationGateway + HydrationSource,
{
    /// Create a client with default configuration.
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, ClientConfig::default())
    }

    /// Start building a client around `gateway`.
    pub fn builder(gateway: G) -> FeedClientBuilder<G> {
        FeedClientBuilder::new(gateway)
    }

    /// Create a client with `config`.
    pub fn with_config(gateway: G, config: ClientConfig) -> Self {
        let gateway = Arc::new(gateway);
        let store = ViewStateStore::new();
        let session = ViewerSession::new();
        let reconciler = Reconciler::from_arc(
            Arc::clone(&gateway),
            store.clone(),
            session.clone(),
            config.reconciler.clone(),
        );

        Self {
            gateway,
            store,
            session,
            reconciler,
            config,
        }
    }

    /// Record `viewer` as signed in and, if configured, hydrate the store.
    ///
    /// Switching to a different viewer drops the previous viewer's state
    /// first. A hydration failure leaves the viewer signed in with an empty
    /// store; call [`hydrate`](Self::hydrate) to retry.
    pub async fn sign_in(&self, viewer: UserId) -> Result<(), InteractionError> {
        require_viewer(Some(&viewer))?;

        let previous = self.session.sign_in(viewer.clone());
        if previous.as_ref() != Some(&viewer) {
            self.store.reset();
        }
        info!(viewer = %viewer, "viewer signed in");

        if self.config.hydrate_on_sign_in {
            self.hydrate().await?;
        }
        Ok(())
    }

    /// Replace local state with the authority's snapshot for the viewer.
    ///
    /// A snapshot that arrives after the viewer changed is dropped.
    pub async fn hydrate(&self) -> Result<(), InteractionError> {
        let (viewer, epoch) = self.session.require_with_epoch()?;

        let fetch = self.gateway.fetch_snapshot(&viewer);
        let snapshot = match self.config.reconciler.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                InteractionError::Network(format!("hydration timed out after {limit:?}"))
            })??,
            None => fetch.await?,
        };

        if self.session.epoch() != epoch {
            debug!(viewer = %viewer, "viewer changed during hydration, snapshot dropped");
            return Ok(());
        }

        info!(
            viewer = %viewer,
            liked = snapshot.liked.len(),
            hidden = snapshot.hidden.len(),
            "hydrated view state"
        );
        self.store.hydrate(snapshot);
        Ok(())
    }

    /// Sign out and drop all local interaction state.
    pub fn sign_out(&self) -> Option<UserId> {
        let previous = self.session.sign_out();
        self.store.reset();
        if let Some(viewer) = &previous {
            info!(viewer = %viewer, "viewer signed out");
        }
        previous
    }

    /// Toggle the viewer's like on `post_id`.
    pub async fn toggle_like(
        &self,
        post_id: &PostId,
    ) -> Result<Settlement<LikeOutcome>, InteractionError> {
        self.reconciler.toggle_like(post_id).await
    }

    /// Hide `post_id`, authored by `author_id`.
    pub async fn hide_post(
        &self,
        post_id: &PostId,
        author_id: &UserId,
    ) -> Result<Settlement<HideOutcome>, InteractionError> {
        self.reconciler.hide_post(post_id, author_id).await
    }

    /// The view-state store.
    pub fn store(&self) -> &ViewStateStore {
        &self.store
    }

    /// The viewer session.
    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    /// A reconciler handle that can be moved into UI tasks.
    pub fn reconciler(&self) -> Reconciler<G> {
        self.reconciler.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The remote authority.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}
