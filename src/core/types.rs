//! Identifiers and remote outcomes shared across layers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::InteractionError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Opaque identifier of a post (the interaction subject).
    PostId
);

string_id!(
    /// Opaque identifier of a user (viewer or author).
    UserId
);

/// The two interaction kinds that go through optimistic reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InteractionKind {
    /// Toggle like.
    Like,
    /// Hide post.
    Hide,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => f.write_str("like"),
            Self::Hide => f.write_str("hide"),
        }
    }
}

/// Authoritative result of a toggle-like call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LikeOutcome {
    /// Whether the viewer likes the post after the call.
    pub liked: bool,
    /// Total likes on the post, as counted by the authority.
    pub like_count: u64,
}

/// Authoritative result of a hide-post call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HideOutcome {
    /// Whether the post is hidden for the viewer after the call.
    pub hidden: bool,
}

/// Bulk read of the viewer's interaction state, used for hydration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ViewerSnapshot {
    /// Posts the viewer has liked.
    pub liked: BTreeSet<PostId>,
    /// Posts the viewer has hidden.
    pub hidden: BTreeSet<PostId>,
    /// Known like totals.
    pub like_counts: BTreeMap<PostId, u64>,
}

/// Resolve the acting viewer, failing fast when there is none.
///
/// A missing or empty identifier is never an authenticated viewer.
pub fn require_viewer(viewer: Option<&UserId>) -> Result<&UserId, InteractionError> {
    match viewer {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(InteractionError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_viewer() {
        let u1 = UserId::from("u1");
        assert_eq!(require_viewer(Some(&u1)), Ok(&u1));
        assert_eq!(require_viewer(None), Err(InteractionError::Unauthenticated));

        let empty = UserId::from("");
        assert_eq!(
            require_viewer(Some(&empty)),
            Err(InteractionError::Unauthenticated)
        );
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PostId::from("p7").to_string(), "p7");
        assert_eq!(InteractionKind::Hide.to_string(), "hide");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_from_backend_json() {
        let json = r#"{
            "liked": ["p1", "p2", "p1"],
            "hidden": ["p5"],
            "likeCounts": { "p1": 3, "p2": 10 }
        }"#;
        let snapshot: ViewerSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.liked.len(), 2);
        assert!(snapshot.hidden.contains(&PostId::from("p5")));
        assert_eq!(snapshot.like_counts.get(&PostId::from("p2")), Some(&10));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_snapshot_missing_fields_default() {
        let snapshot: ViewerSnapshot = serde_json::from_str(r#"{"liked": ["p1"]}"#).unwrap();
        assert!(snapshot.hidden.is_empty());
        assert!(snapshot.like_counts.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_like_outcome_field_names() {
        let outcome: LikeOutcome =
            serde_json::from_str(r#"{"liked": false, "likeCount": 4}"#).unwrap();
        assert_eq!(
            outcome,
            LikeOutcome {
                liked: false,
                like_count: 4
            }
        );
    }
}
