//! Payout ledger entries.
//!
//! A ledger row is persisted for every attempted payout, transfer success or
//! not, so failed transfers leave a reconciliation trail instead of a stuck
//! state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CallId, GroupSessionId, Money, PayoutId, RecordingId, SeriesId, Timestamp, UserId,
};

/// The revenue event a payout settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoutSource {
    Call { id: CallId },
    GroupSession { id: GroupSessionId },
    Recording { id: RecordingId },
    Series { id: SeriesId },
}

/// What happened when the transfer was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayoutOutcome {
    /// Transfer was accepted by the processor.
    Transferred { transfer_reference: String },
    /// Transfer call failed; amount awaits manual reconciliation.
    TransferFailed { error: String },
}

/// One attempted payout to a mentor or seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutLedgerEntry {
    pub id: PayoutId,
    pub mentor_id: UserId,
    pub source: PayoutSource,

    /// Gross revenue the split was computed from.
    pub gross: Money,

    /// The mentor's share actually sent (or attempted).
    pub payout: Money,

    pub outcome: PayoutOutcome,
    pub created_at: Timestamp,
}

impl PayoutLedgerEntry {
    /// Records a successful transfer.
    pub fn transferred(
        mentor_id: UserId,
        source: PayoutSource,
        gross: Money,
        payout: Money,
        transfer_reference: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PayoutId::new(),
            mentor_id,
            source,
            gross,
            payout,
            outcome: PayoutOutcome::Transferred {
                transfer_reference: transfer_reference.into(),
            },
            created_at: now,
        }
    }

    /// Records a failed transfer attempt.
    pub fn transfer_failed(
        mentor_id: UserId,
        source: PayoutSource,
        gross: Money,
        payout: Money,
        error: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PayoutId::new(),
            mentor_id,
            source,
            gross,
            payout,
            outcome: PayoutOutcome::TransferFailed {
                error: error.into(),
            },
            created_at: now,
        }
    }

    /// True if the transfer reached the processor.
    pub fn settled(&self) -> bool {
        matches!(self.outcome, PayoutOutcome::Transferred { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    #[test]
    fn transferred_entry_is_settled() {
        let entry = PayoutLedgerEntry::transferred(
            UserId::new(),
            PayoutSource::GroupSession {
                id: GroupSessionId::new(),
            },
            Money::from_cents(10_000),
            Money::from_cents(7_500),
            "tr_123",
            now(),
        );
        assert!(entry.settled());
    }

    #[test]
    fn failed_entry_keeps_amounts_for_reconciliation() {
        let entry = PayoutLedgerEntry::transfer_failed(
            UserId::new(),
            PayoutSource::Call { id: CallId::new() },
            Money::from_cents(5_000),
            Money::from_cents(3_750),
            "network timeout",
            now(),
        );
        assert!(!entry.settled());
        assert_eq!(entry.payout, Money::from_cents(3_750));
        assert!(matches!(
            entry.outcome,
            PayoutOutcome::TransferFailed { ref error } if error == "network timeout"
        ));
    }
}
