//! Purchase records and access grants.
//!
//! Purchase rows are append-only: exactly one per completed checkout event,
//! keyed by the processor's event id. Access grants derive from purchases
//! and are upsert-idempotent. The payment processor is the source of truth
//! for "money moved"; these rows are the source of truth for "access
//! granted".

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CallId, GroupSessionId, Money, PurchaseId, RecordingId, SeriesId, Timestamp, UserId,
};

use super::PurchaseKind;

/// The entity a purchase paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseTarget {
    Recording { id: RecordingId },
    Series { id: SeriesId },
    Call { id: CallId },
    GroupSession { id: GroupSessionId },
}

impl PurchaseTarget {
    pub fn kind(&self) -> PurchaseKind {
        match self {
            PurchaseTarget::Recording { .. } => PurchaseKind::Recording,
            PurchaseTarget::Series { .. } => PurchaseKind::Series,
            PurchaseTarget::Call { .. } => PurchaseKind::Call,
            PurchaseTarget::GroupSession { .. } => PurchaseKind::GroupSession,
        }
    }
}

/// Append-only record of one completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,

    /// Processor event id this record was written for; unique.
    pub event_id: String,

    /// Buyer.
    pub user_id: UserId,

    /// What was bought.
    pub target: PurchaseTarget,

    /// Gross amount in minor units.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Processor payment reference, used when issuing refunds.
    pub payment_reference: Option<String>,

    pub created_at: Timestamp,
}

impl PurchaseRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PurchaseId,
        event_id: impl Into<String>,
        user_id: UserId,
        target: PurchaseTarget,
        amount: Money,
        currency: impl Into<String>,
        payment_reference: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            event_id: event_id.into(),
            user_id,
            target,
            amount,
            currency: currency.into(),
            payment_reference,
            created_at: now,
        }
    }
}

/// What an access grant unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessTarget {
    Recording { id: RecordingId },
    Series { id: SeriesId },
}

/// A user's access to a recording or series, derived from a purchase.
///
/// Grants are upsert-idempotent: writing the same (user, target) pair twice
/// must not error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub user_id: UserId,
    pub target: AccessTarget,
    pub granted_at: Timestamp,
}

impl AccessGrant {
    pub fn recording(user_id: UserId, recording_id: RecordingId, now: Timestamp) -> Self {
        Self {
            user_id,
            target: AccessTarget::Recording { id: recording_id },
            granted_at: now,
        }
    }

    pub fn series(user_id: UserId, series_id: SeriesId, now: Timestamp) -> Self {
        Self {
            user_id,
            target: AccessTarget::Series { id: series_id },
            granted_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_717_408_800)
    }

    #[test]
    fn purchase_target_reports_its_kind() {
        let target = PurchaseTarget::Recording {
            id: RecordingId::new(),
        };
        assert_eq!(target.kind(), PurchaseKind::Recording);

        let target = PurchaseTarget::GroupSession {
            id: GroupSessionId::new(),
        };
        assert_eq!(target.kind(), PurchaseKind::GroupSession);
    }

    #[test]
    fn purchase_record_carries_event_identity() {
        let record = PurchaseRecord::new(
            PurchaseId::new(),
            "evt_123",
            UserId::new(),
            PurchaseTarget::Series {
                id: SeriesId::new(),
            },
            Money::from_cents(4_900),
            "usd",
            Some("pi_abc".to_string()),
            now(),
        );

        assert_eq!(record.event_id, "evt_123");
        assert_eq!(record.amount, Money::from_cents(4_900));
        assert_eq!(record.payment_reference.as_deref(), Some("pi_abc"));
    }

    #[test]
    fn grant_constructors_set_targets() {
        let user = UserId::new();
        let recording = RecordingId::new();
        let series = SeriesId::new();

        let g = AccessGrant::recording(user, recording, now());
        assert_eq!(g.target, AccessTarget::Recording { id: recording });

        let g = AccessGrant::series(user, series, now());
        assert_eq!(g.target, AccessTarget::Series { id: series });
    }
}
