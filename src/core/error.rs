//! Error types for feedsync.

use thiserror::Error;

use super::types::PostId;

/// Errors from an interaction (like, hide) or from the remote authority.
///
/// Every variant is distinguishable so the reconciler can decide whether a
/// speculative mutation has to be rolled back. Errors are returned to the
/// caller verbatim; rendering them is the caller's job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// No signed-in viewer attempted a mutating action.
    #[error("no authenticated viewer")]
    Unauthenticated,

    /// The viewer tried to act on their own post where that is forbidden.
    #[error("cannot perform this action on your own post {post_id}")]
    SelfActionForbidden {
        /// Targeted post.
        post_id: PostId,
    },

    /// The post no longer exists on the remote authority.
    #[error("post {post_id} not found")]
    NotFound {
        /// Missing post.
        post_id: PostId,
    },

    /// Transport-level failure (including request timeouts).
    #[error("network error: {0}")]
    Network(String),
}

impl InteractionError {
    /// Errors that are detected before any speculative mutation is applied.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SelfActionForbidden { .. })
    }

    /// Short human-readable text for a dismissible notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Please sign in to continue.",
            Self::SelfActionForbidden { .. } => "You can't do that to your own post.",
            Self::NotFound { .. } => "This post is no longer available.",
            Self::Network(_) => "Something went wrong. Check your connection and try again.",
        }
    }
}

/// Top-level feedsync errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Interaction error.
    #[error("interaction error: {0}")]
    Interaction(#[from] InteractionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_kinds() {
        assert!(InteractionError::Unauthenticated.is_precondition());
        assert!(
            InteractionError::SelfActionForbidden {
                post_id: PostId::from("p1")
            }
            .is_precondition()
        );
        assert!(!InteractionError::NotFound { post_id: PostId::from("p1") }.is_precondition());
        assert!(!InteractionError::Network("reset".into()).is_precondition());
    }

    #[test]
    fn test_display() {
        let err = InteractionError::NotFound { post_id: PostId::from("p9") };
        assert_eq!(err.to_string(), "post p9 not found");

        let err: FeedError = InteractionError::Network("connection reset".into()).into();
        assert_eq!(
            err.to_string(),
            "interaction error: network error: connection reset"
        );
    }

    #[test]
    fn test_user_message_is_not_empty() {
        let errors = [
            InteractionError::Unauthenticated,
            InteractionError::SelfActionForbidden { post_id: PostId::from("p") },
            InteractionError::NotFound { post_id: PostId::from("p") },
            InteractionError::Network("x".into()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
