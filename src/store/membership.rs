//! Boolean membership set of post identifiers.

use std::collections::BTreeSet;

use crate::core::PostId;

/// A set of post ids where membership is strictly boolean.
///
/// Every mutator reports whether membership actually changed so the store
/// can skip notifying observers on no-op writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    ids: BTreeSet<PostId>,
}

impl MembershipSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: &PostId) -> bool {
        self.ids.contains(id)
    }

    /// Set membership of `id`. Returns `true` if membership changed.
    pub fn set(&mut self, id: &PostId, member: bool) -> bool {
        if member {
            self.ids.insert(id.clone())
        } else {
            self.ids.remove(id)
        }
    }

    /// Replace all members. Duplicates collapse. Returns `true` if changed.
    pub fn replace<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = PostId>,
    {
        let next: BTreeSet<PostId> = ids.into_iter().collect();
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    /// Remove all members. Returns `true` if the set was non-empty.
    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate members in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PostId> {
        self.ids.iter()
    }
}

impl FromIterator<PostId> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = PostId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PostId {
        PostId::from(s)
    }

    #[test]
    fn test_set_reports_change() {
        let mut set = MembershipSet::new();

        assert!(set.set(&pid("p1"), true));
        assert!(!set.set(&pid("p1"), true));
        assert_eq!(set.len(), 1);

        assert!(set.set(&pid("p1"), false));
        assert!(!set.set(&pid("p1"), false));
        assert!(set.is_empty());
    }

    #[test]
    fn test_replace_dedups() {
        let mut set = MembershipSet::new();
        let changed = set.replace(vec![pid("p1"), pid("p2"), pid("p1")]);

        assert!(changed);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&pid("p1")));
        assert!(set.contains(&pid("p2")));
    }

    #[test]
    fn test_replace_same_members_is_noop() {
        let mut set: MembershipSet = vec![pid("p1"), pid("p2")].into_iter().collect();
        assert!(!set.replace(vec![pid("p2"), pid("p1")]));
    }

    #[test]
    fn test_clear() {
        let mut set: MembershipSet = vec![pid("p1")].into_iter().collect();
        assert!(set.clear());
        assert!(!set.clear());
    }
}
