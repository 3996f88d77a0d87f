//! In-memory remote authority.
//!
//! Keeps like records and hide records the way the hosted backend does and
//! answers the gateway calls from them. Latency and transport faults can be
//! injected so reconciliation paths can be exercised without a network.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::core::constants::DEFAULT_MEMORY_LATENCY;
use crate::core::{
    HideOutcome, HydrationSource, InteractionError, LikeOutcome, MutationGateway, PostId, UserId,
    ViewerSnapshot, require_viewer,
};

#[derive(Debug, Clone)]
struct PostRecord {
    author: UserId,
    likes: BTreeSet<UserId>,
}

/// Builder for an [`InMemoryAuthority`].
#[derive(Debug, Default)]
pub struct InMemoryAuthorityBuilder {
    posts: Vec<(PostId, UserId)>,
    likes: Vec<(PostId, UserId)>,
    latency: Option<Duration>,
}

impl InMemoryAuthorityBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post authored by `author`.
    pub fn post(mut self, post_id: impl Into<PostId>, author: impl Into<UserId>) -> Self {
        self.posts.push((post_id.into(), author.into()));
        self
    }

    /// Seed an existing like record. Ignored if the post is not added.
    pub fn like(mut self, post_id: impl Into<PostId>, user: impl Into<UserId>) -> Self {
        self.likes.push((post_id.into(), user.into()));
        self
    }

    /// Simulated latency for every call.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Build the authority.
    pub fn build(self) -> InMemoryAuthority {
        let mut posts: HashMap<PostId, PostRecord> = self
            .posts
            .into_iter()
            .map(|(id, author)| {
                (
                    id,
                    PostRecord {
                        author,
                        likes: BTreeSet::new(),
                    },
                )
            })
            .collect();

        for (post_id, user) in self.likes {
            if let Some(record) = posts.get_mut(&post_id) {
                record.likes.insert(user);
            }
        }

        InMemoryAuthority {
            posts: RwLock::new(posts),
            hidden: RwLock::new(HashMap::new()),
            faults: Mutex::new(VecDeque::new()),
            latency: self.latency.unwrap_or(DEFAULT_MEMORY_LATENCY),
        }
    }
}

/// Remote authority backed by in-process maps.
#[derive(Debug)]
pub struct InMemoryAuthority {
    posts: RwLock<HashMap<PostId, PostRecord>>,
    hidden: RwLock<HashMap<UserId, BTreeSet<PostId>>>,
    faults: Mutex<VecDeque<InteractionError>>,
    latency: Duration,
}

impl InMemoryAuthority {
    /// Empty authority with no latency.
    pub fn new() -> Self {
        InMemoryAuthorityBuilder::new().build()
    }

    /// Start building an authority.
    pub fn builder() -> InMemoryAuthorityBuilder {
        InMemoryAuthorityBuilder::new()
    }

    /// Add (or replace) a post.
    pub async fn add_post(&self, post_id: PostId, author: UserId) {
        self.posts.write().await.insert(
            post_id,
            PostRecord {
                author,
                likes: BTreeSet::new(),
            },
        );
    }

    /// Delete a post. Returns `true` if it existed.
    pub async fn remove_post(&self, post_id: &PostId) -> bool {
        self.posts.write().await.remove(post_id).is_some()
    }

    /// Make the next call fail with `error` after its simulated latency.
    ///
    /// Faults queue up and are consumed one per call, in order.
    pub async fn fail_next(&self, error: InteractionError) {
        self.faults.lock().await.push_back(error);
    }

    /// Authoritative like total of a post.
    pub async fn like_count(&self, post_id: &PostId) -> Option<u64> {
        self.posts
            .read()
            .await
            .get(post_id)
            .map(|record| record.likes.len() as u64)
    }

    /// Whether `viewer` hid `post_id`.
    pub async fn is_hidden_for(&self, viewer: &UserId, post_id: &PostId) -> bool {
        self.hidden
            .read()
            .await
            .get(viewer)
            .is_some_and(|posts| posts.contains(post_id))
    }

    /// Simulated transport: latency, then an injected fault if one is queued.
    async fn transport(&self) -> Result<(), InteractionError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.faults.lock().await.pop_front() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationGateway for InMemoryAuthority {
    async fn toggle_like(
        &self,
        post_id: &PostId,
        viewer: &UserId,
    ) -> Result<LikeOutcome, InteractionError> {
        let viewer = require_viewer(Some(viewer))?;
        self.transport().await?;

        let mut posts = self.posts.write().await;
        let record = posts
            .get_mut(post_id)
            .ok_or_else(|| InteractionError::NotFound {
                post_id: post_id.clone(),
            })?;

        // Toggle decided by the existing like record
        let liked = if record.likes.remove(viewer) {
            false
        } else {
            record.likes.insert(viewer.clone());
            true
        };

        Ok(LikeOutcome {
            liked,
            like_count: record.likes.len() as u64,
        })
    }

    async fn hide_post(
        &self,
        post_id: &PostId,
        viewer: &UserId,
    ) -> Result<HideOutcome, InteractionError> {
        let viewer = require_viewer(Some(viewer))?;
        self.transport().await?;

        let posts = self.posts.read().await;
        let record = posts.get(post_id).ok_or_else(|| InteractionError::NotFound {
            post_id: post_id.clone(),
        })?;
        if &record.author == viewer {
            return Err(InteractionError::SelfActionForbidden {
                post_id: post_id.clone(),
            });
        }

        self.hidden
            .write()
            .await
            .entry(viewer.clone())
            .or_default()
            .insert(post_id.clone());

        Ok(HideOutcome { hidden: true })
    }
}

impl HydrationSource for InMemoryAuthority {
    async fn fetch_snapshot(&self, viewer: &UserId) -> Result<ViewerSnapshot, InteractionError> {
        let viewer = require_viewer(Some(viewer))?;
        self.transport().await?;

        let posts = self.posts.read().await;
        let mut snapshot = ViewerSnapshot::default();
        for (post_id, record) in posts.iter() {
            if record.likes.contains(viewer) {
                snapshot.liked.insert(post_id.clone());
            }
            snapshot
                .like_counts
                .insert(post_id.clone(), record.likes.len() as u64);
        }
        if let Some(hidden) = self.hidden.read().await.get(viewer) {
            snapshot.hidden = hidden.clone();
        }

        Ok(snapshot)
    }
}
