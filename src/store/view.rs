//! View-state store.
//!
//! Holds the viewer's liked and hidden post sets plus the last authoritative
//! like totals. The store performs no I/O and cannot fail. Mutations are
//! synchronous; observers subscribed through [`ViewStateStore::subscribe`]
//! are notified as part of the mutation, and only when state changed.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use super::membership::MembershipSet;
use crate::core::{PostId, ViewerSnapshot};

/// Snapshot of the viewer's interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    liked: MembershipSet,
    hidden: MembershipSet,
    like_counts: BTreeMap<PostId, u64>,
    revision: u64,
}

impl ViewState {
    /// Posts the viewer has liked.
    pub fn liked(&self) -> &MembershipSet {
        &self.liked
    }

    /// Posts the viewer has hidden.
    pub fn hidden(&self) -> &MembershipSet {
        &self.hidden
    }

    /// Whether the viewer likes `id`.
    pub fn is_liked(&self, id: &PostId) -> bool {
        self.liked.contains(id)
    }

    /// Whether the viewer hid `id`.
    pub fn is_hidden(&self, id: &PostId) -> bool {
        self.hidden.contains(id)
    }

    /// Last authoritative like total for `id`, if known.
    pub fn like_count(&self, id: &PostId) -> Option<u64> {
        self.like_counts.get(id).copied()
    }

    /// Monotonic counter bumped on every observable mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Shared handle to the view state.
///
/// Cloning is cheap; every clone refers to the same state. Consumers are
/// handed a handle explicitly rather than reaching for a global.
#[derive(Debug, Clone)]
pub struct ViewStateStore {
    tx: Arc<watch::Sender<ViewState>>,
}

impl ViewStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_state(ViewState::default())
    }

    /// Create a store pre-populated from a snapshot.
    pub fn from_snapshot(snapshot: ViewerSnapshot) -> Self {
        let store = Self::new();
        store.hydrate(snapshot);
        store
    }

    fn with_state(state: ViewState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts with the current state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Project a value out of the current state.
    pub fn select<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> ViewState {
        (*self.tx.borrow()).clone()
    }

    /// Whether the viewer likes `id`.
    pub fn is_liked(&self, id: &PostId) -> bool {
        self.select(|s| s.is_liked(id))
    }

    /// Whether the viewer hid `id`.
    pub fn is_hidden(&self, id: &PostId) -> bool {
        self.select(|s| s.is_hidden(id))
    }

    /// Last authoritative like total for `id`, if known.
    pub fn like_count(&self, id: &PostId) -> Option<u64> {
        self.select(|s| s.like_count(id))
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.select(ViewState::revision)
    }

    /// Replace the whole like set (hydration from the remote authority).
    pub fn set_like_membership<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = PostId>,
    {
        self.mutate(|s| s.liked.replace(ids))
    }

    /// Set like membership of one post.
    ///
    /// Idempotent: when `liked` already matches, nothing changes and no
    /// observer is notified. Returns whether state changed.
    pub fn apply_like_membership(&self, id: &PostId, liked: bool) -> bool {
        self.mutate(|s| s.liked.set(id, liked))
    }

    /// Replace the whole hidden set (hydration from the remote authority).
    pub fn set_hidden_membership<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = PostId>,
    {
        self.mutate(|s| s.hidden.replace(ids))
    }

    /// Set hidden membership of one post. Idempotent.
    pub fn apply_hidden_membership(&self, id: &PostId, hidden: bool) -> bool {
        self.mutate(|s| s.hidden.set(id, hidden))
    }

    /// Remove a post from the hidden set (rollback of a speculative hide).
    pub fn remove_hidden(&self, id: &PostId) -> bool {
        self.apply_hidden_membership(id, false)
    }

    /// Record the authoritative like total for a post.
    pub fn set_like_count(&self, id: &PostId, count: u64) -> bool {
        self.mutate(|s| s.like_counts.insert(id.clone(), count) != Some(count))
    }

    /// Replace liked, hidden and like totals in one notification.
    pub fn hydrate(&self, snapshot: ViewerSnapshot) -> bool {
        let ViewerSnapshot {
            liked,
            hidden,
            like_counts,
        } = snapshot;
        self.mutate(move |s| {
            let liked_changed = s.liked.replace(liked);
            let hidden_changed = s.hidden.replace(hidden);
            let counts_changed = s.like_counts != like_counts;
            s.like_counts = like_counts;
            liked_changed || hidden_changed || counts_changed
        })
    }

    /// Drop all interaction state (sign-out).
    pub fn reset(&self) -> bool {
        self.mutate(|s| {
            let liked_changed = s.liked.clear();
            let hidden_changed = s.hidden.clear();
            let counts_changed = !s.like_counts.is_empty();
            s.like_counts.clear();
            liked_changed || hidden_changed || counts_changed
        })
    }

    fn mutate(&self, f: impl FnOnce(&mut ViewState) -> bool) -> bool {
        self.tx.send_if_modified(|state| {
            let changed = f(state);
            if changed {
                state.revision += 1;
            }
            changed
        })
    }
}

impl Default for ViewStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PostId {
        PostId::from(s)
    }

    #[test]
    fn test_apply_like_is_idempotent() {
        let store = ViewStateStore::new();
        let mut rx = store.subscribe();

        assert!(store.apply_like_membership(&pid("p1"), true));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        let before = store.snapshot();
        assert!(!store.apply_like_membership(&pid("p1"), true));

        // No second notification, identical state
        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_set_like_membership_replaces() {
        let store = ViewStateStore::new();
        store.apply_like_membership(&pid("old"), true);

        store.set_like_membership(vec![pid("p1"), pid("p2"), pid("p2")]);

        let state = store.snapshot();
        assert_eq!(state.liked().len(), 2);
        assert!(!state.is_liked(&pid("old")));
        assert!(state.is_liked(&pid("p1")));
    }

    #[test]
    fn test_hidden_set_and_remove() {
        let store = ViewStateStore::new();

        assert!(store.apply_hidden_membership(&pid("p3"), true));
        assert!(store.is_hidden(&pid("p3")));

        assert!(store.remove_hidden(&pid("p3")));
        assert!(!store.is_hidden(&pid("p3")));
        assert!(!store.remove_hidden(&pid("p3")));

        store.set_hidden_membership(vec![pid("a"), pid("b")]);
        assert_eq!(store.select(|s| s.hidden().len()), 2);
    }

    #[test]
    fn test_like_count() {
        let store = ViewStateStore::new();
        assert_eq!(store.like_count(&pid("p1")), None);

        assert!(store.set_like_count(&pid("p1"), 4));
        assert!(!store.set_like_count(&pid("p1"), 4));
        assert_eq!(store.like_count(&pid("p1")), Some(4));
    }

    #[test]
    fn test_hydrate_single_notification() {
        let store = ViewStateStore::new();
        let mut rx = store.subscribe();

        let mut snapshot = ViewerSnapshot::default();
        snapshot.liked.insert(pid("p1"));
        snapshot.hidden.insert(pid("p2"));
        snapshot.like_counts.insert(pid("p1"), 12);

        assert!(store.hydrate(snapshot.clone()));
        assert_eq!(store.revision(), 1);
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        // Same snapshot again changes nothing
        assert!(!store.hydrate(snapshot));
        assert!(!rx.has_changed().unwrap());

        assert!(store.is_liked(&pid("p1")));
        assert!(store.is_hidden(&pid("p2")));
        assert_eq!(store.like_count(&pid("p1")), Some(12));
    }

    #[test]
    fn test_reset() {
        let mut snapshot = ViewerSnapshot::default();
        snapshot.liked.insert(pid("p1"));
        let store = ViewStateStore::from_snapshot(snapshot);

        assert!(store.reset());
        assert!(store.snapshot().liked().is_empty());
        assert!(!store.reset());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ViewStateStore::new();
        let other = store.clone();

        other.apply_like_membership(&pid("p1"), true);
        assert!(store.is_liked(&pid("p1")));
    }

    #[tokio::test]
    async fn test_subscriber_wakes_on_change() {
        let store = ViewStateStore::new();
        let mut rx = store.subscribe();

        let writer = store.clone();
        let handle = tokio::spawn(async move {
            writer.apply_hidden_membership(&PostId::from("p9"), true);
        });

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_hidden(&pid("p9")));
        handle.await.unwrap();
    }
}
