//! Signed-in viewer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::core::{InteractionError, UserId, require_viewer};

#[derive(Debug)]
struct SessionInner {
    tx: watch::Sender<Option<UserId>>,
    /// Bumped whenever the signed-in viewer changes
    epoch: AtomicU64,
}

/// Observable handle to the currently signed-in viewer.
///
/// Authentication itself happens elsewhere; this only records who the
/// identity provider says is signed in. Every change of viewer (sign-out,
/// or sign-in as somebody else) starts a new epoch, which lets work begun
/// under the previous viewer detect that it no longer applies.
#[derive(Debug, Clone)]
pub struct ViewerSession {
    inner: Arc<SessionInner>,
}

impl ViewerSession {
    /// Session with nobody signed in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                tx,
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Session with `viewer` already signed in.
    pub fn signed_in(viewer: UserId) -> Self {
        let session = Self::new();
        session.sign_in(viewer);
        session
    }

    /// Record `viewer` as signed in. Returns the previous viewer.
    pub fn sign_in(&self, viewer: UserId) -> Option<UserId> {
        self.replace(Some(viewer))
    }

    /// Clear the signed-in viewer. Returns the previous viewer.
    pub fn sign_out(&self) -> Option<UserId> {
        self.replace(None)
    }

    fn replace(&self, next: Option<UserId>) -> Option<UserId> {
        let mut previous = None;
        self.inner.tx.send_if_modified(|current| {
            if *current == next {
                previous = current.clone();
                return false;
            }
            previous = std::mem::replace(current, next);
            self.inner.epoch.fetch_add(1, Ordering::AcqRel);
            true
        });
        previous
    }

    /// Current viewer, if any.
    pub fn current(&self) -> Option<UserId> {
        (*self.inner.tx.borrow()).clone()
    }

    /// Current viewer, or [`InteractionError::Unauthenticated`].
    pub fn require(&self) -> Result<UserId, InteractionError> {
        require_viewer(self.inner.tx.borrow().as_ref()).cloned()
    }

    /// Current viewer together with the epoch it was signed in under.
    pub fn require_with_epoch(&self) -> Result<(UserId, u64), InteractionError> {
        let current = self.inner.tx.borrow();
        let viewer = require_viewer(current.as_ref())?.clone();
        Ok((viewer, self.inner.epoch.load(Ordering::Acquire)))
    }

    /// Number of viewer changes so far.
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Subscribe to sign-in/sign-out changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.inner.tx.subscribe()
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_out() {
        let session = ViewerSession::new();
        assert_eq!(session.current(), None);
        assert_eq!(session.require(), Err(InteractionError::Unauthenticated));

        assert_eq!(session.sign_in(UserId::from("u1")), None);
        assert_eq!(session.require(), Ok(UserId::from("u1")));

        assert_eq!(session.sign_out(), Some(UserId::from("u1")));
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_empty_viewer_is_unauthenticated() {
        let session = ViewerSession::signed_in(UserId::from(""));
        assert_eq!(session.require(), Err(InteractionError::Unauthenticated));
        assert!(session.require_with_epoch().is_err());
    }

    #[test]
    fn test_epoch_tracks_viewer_changes() {
        let session = ViewerSession::new();
        assert_eq!(session.epoch(), 0);

        // Signing out nobody is not a change
        assert_eq!(session.sign_out(), None);
        assert_eq!(session.epoch(), 0);

        session.sign_in(UserId::from("u1"));
        assert_eq!(session.require_with_epoch(), Ok((UserId::from("u1"), 1)));

        // Same viewer again keeps the epoch
        assert_eq!(session.sign_in(UserId::from("u1")), Some(UserId::from("u1")));
        assert_eq!(session.epoch(), 1);

        session.sign_in(UserId::from("u2"));
        assert_eq!(session.epoch(), 2);

        session.sign_out();
        assert_eq!(session.epoch(), 3);
    }

    #[test]
    fn test_unchanged_viewer_does_not_notify() {
        let session = ViewerSession::signed_in(UserId::from("u1"));
        let rx = session.subscribe();

        session.sign_in(UserId::from("u1"));
        assert!(!rx.has_changed().unwrap());

        session.sign_out();
        assert!(rx.has_changed().unwrap());
    }
}
