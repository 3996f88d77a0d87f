//! Sequence fence for overlapping invocations.
//!
//! Every invocation takes a ticket for its (post, kind) key. When the remote
//! call settles, only the invocation holding the latest ticket for that key
//! is still authoritative; earlier ones were superseded by a newer tap on
//! the same post.
//!
//! Each key also carries the last membership the authority confirmed. It is
//! captured when the first invocation on an idle key begins and moved forward
//! by every successful settlement, stale or not. A failing current invocation
//! rolls back to it rather than to its own snapshot, which may be an earlier
//! invocation's speculation.
//!
//! Tickets are scoped to a session epoch. Beginning an invocation under a new
//! epoch drops every entry from the previous one, and tickets from an old
//! epoch never settle as current.

use std::collections::HashMap;

use crate::core::{InteractionKind, PostId};

type FenceKey = (PostId, InteractionKind);

/// Handle of one invocation, returned by [`SequenceFence::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Session epoch the invocation started in.
    pub epoch: u64,
    /// Sequence number (monotonic across all keys).
    pub seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct FenceEntry {
    /// Latest issued sequence number on the key
    latest: u64,
    /// Last membership confirmed by the authority
    baseline: bool,
}

/// Tracks the latest issued ticket and confirmed baseline per (post, kind).
#[derive(Debug, Clone, Default)]
pub struct SequenceFence {
    /// Session epoch the entries belong to
    epoch: u64,
    /// Last issued sequence number
    next_seq: u64,
    /// In-flight keys
    entries: HashMap<FenceKey, FenceEntry>,
}

impl SequenceFence {
    /// Create an empty fence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new invocation on `post_id`/`kind`.
    ///
    /// `active` is the local membership before the speculative mutation; it
    /// becomes the baseline only when no invocation on the key is in flight.
    /// Any invocation already in flight on the same key becomes stale.
    pub fn begin(
        &mut self,
        epoch: u64,
        post_id: &PostId,
        kind: InteractionKind,
        active: bool,
    ) -> Ticket {
        if epoch != self.epoch {
            self.entries.clear();
            self.epoch = epoch;
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        self.entries
            .entry((post_id.clone(), kind))
            .and_modify(|entry| entry.latest = seq)
            .or_insert(FenceEntry {
                latest: seq,
                baseline: active,
            });

        Ticket { epoch, seq }
    }

    /// Settle `ticket`, recording `confirmed` membership if the call succeeded.
    ///
    /// Returns `Some(baseline)` if the ticket was the latest on its key; the
    /// key is then released. Returns `None` for stale tickets, leaving the
    /// newer entry in place with its baseline moved to `confirmed`.
    pub fn settle(
        &mut self,
        post_id: &PostId,
        kind: InteractionKind,
        ticket: Ticket,
        confirmed: Option<bool>,
    ) -> Option<bool> {
        if ticket.epoch != self.epoch {
            return None;
        }

        let key = (post_id.clone(), kind);
        let entry = self.entries.get_mut(&key)?;
        if let Some(confirmed) = confirmed {
            entry.baseline = confirmed;
        }
        if entry.latest != ticket.seq {
            return None;
        }

        let baseline = entry.baseline;
        self.entries.remove(&key);
        Some(baseline)
    }

    /// Number of keys with an invocation in flight.
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }
}
