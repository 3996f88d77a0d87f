//! Per-invocation state machine.

use std::fmt;

use tracing::{debug, warn};

use super::fence::Ticket;
use crate::core::{InteractionKind, PostId};

/// Phase of one reconciliation.
///
/// `Idle → Speculative → (Reconciled | RolledBack | Superseded)`; every
/// terminal phase collapses back to `Idle` when the operation is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No pending operation.
    Idle,
    /// Local state flipped, remote call in flight.
    Speculative,
    /// Local state overwritten with the authoritative result.
    Reconciled,
    /// Local state restored after the remote call failed.
    RolledBack,
    /// Remote call settled after a newer invocation on the same key; the
    /// settlement was not written.
    Superseded,
}

impl Phase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Speculative)
                | (Phase::Speculative, Phase::Reconciled)
                | (Phase::Speculative, Phase::RolledBack)
                | (Phase::Speculative, Phase::Superseded)
        )
    }

    /// Whether this phase ends the operation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Reconciled | Phase::RolledBack | Phase::Superseded)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Speculative => "speculative",
            Phase::Reconciled => "reconciled",
            Phase::RolledBack => "rolled_back",
            Phase::Superseded => "superseded",
        };
        f.write_str(name)
    }
}

/// One in-flight reconciliation. Not persisted.
///
/// Dropping an operation that never reached a terminal phase (its future was
/// cancelled mid-call) leaves the speculative state in place and is logged.
#[derive(Debug)]
pub struct PendingOperation {
    /// Subject of the interaction.
    pub post_id: PostId,
    /// Like or hide.
    pub kind: InteractionKind,
    /// Membership before the speculative mutation.
    pub was_active: bool,
    /// Fence ticket.
    pub ticket: Ticket,
    phase: Phase,
}

impl PendingOperation {
    /// New operation in the `Idle` phase.
    pub fn new(post_id: PostId, kind: InteractionKind, was_active: bool, ticket: Ticket) -> Self {
        Self {
            post_id,
            kind,
            was_active,
            ticket,
            phase: Phase::Idle,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`.
    pub(crate) fn enter(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        debug!(
            post_id = %self.post_id,
            kind = %self.kind,
            seq = self.ticket.seq,
            from = %self.phase,
            to = %next,
            "reconcile transition"
        );
        self.phase = next;
    }
}

impl Drop for PendingOperation {
    fn drop(&mut self) {
        if self.phase != Phase::Idle && !self.phase.is_terminal() {
            warn!(
                post_id = %self.post_id,
                kind = %self.kind,
                seq = self.ticket.seq,
                "operation dropped before settling"
            );
        }
    }
}

/// Result of a settled reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement<T> {
    /// The authoritative outcome was written to local state.
    Reconciled(T),
    /// A newer invocation on the same post owns local state; the outcome
    /// was not written.
    Superseded(T),
}

impl<T> Settlement<T> {
    /// The remote outcome, whether or not it was written.
    pub fn outcome(&self) -> &T {
        match self {
            Settlement::Reconciled(outcome) | Settlement::Superseded(outcome) => outcome,
        }
    }

    /// Consume and return the remote outcome.
    pub fn into_outcome(self) -> T {
        match self {
            Settlement::Reconciled(outcome) | Settlement::Superseded(outcome) => outcome,
        }
    }

    /// Whether the outcome was written to local state.
    pub fn is_reconciled(&self) -> bool {
        matches!(self, Settlement::Reconciled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(Phase::Idle.can_transition_to(Phase::Speculative));
        assert!(Phase::Speculative.can_transition_to(Phase::Reconciled));
        assert!(Phase::Speculative.can_transition_to(Phase::RolledBack));
        assert!(Phase::Speculative.can_transition_to(Phase::Superseded));

        assert!(!Phase::Idle.can_transition_to(Phase::Reconciled));
        assert!(!Phase::Reconciled.can_transition_to(Phase::RolledBack));
        assert!(!Phase::RolledBack.can_transition_to(Phase::Speculative));
    }

    #[test]
    fn test_operation_walk() {
        let ticket = Ticket { epoch: 0, seq: 1 };
        let mut op = PendingOperation::new(PostId::from("p1"), InteractionKind::Like, false, ticket);
        assert_eq!(op.phase(), Phase::Idle);

        op.enter(Phase::Speculative);
        assert!(!op.phase().is_terminal());

        op.enter(Phase::RolledBack);
        assert!(op.phase().is_terminal());
    }

    #[test]
    fn test_settlement_accessors() {
        let settled = Settlement::Reconciled(7);
        assert!(settled.is_reconciled());
        assert_eq!(*settled.outcome(), 7);

        let stale = Settlement::Superseded(3);
        assert!(!stale.is_reconciled());
        assert_eq!(stale.into_outcome(), 3);
    }
}
