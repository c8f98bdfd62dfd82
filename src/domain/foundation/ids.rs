//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a platform account (patient or mentor).
    UserId
);

uuid_id!(
    /// Unique identifier for a one-on-one call.
    CallId
);

uuid_id!(
    /// Unique identifier for a group session.
    GroupSessionId
);

uuid_id!(
    /// Unique identifier for a group-session participant row.
    ParticipantId
);

uuid_id!(
    /// Unique identifier for a purchase record.
    PurchaseId
);

uuid_id!(
    /// Unique identifier for a payout ledger entry.
    PayoutId
);

uuid_id!(
    /// Unique identifier for a published recording.
    RecordingId
);

uuid_id!(
    /// Unique identifier for a recording series (bundle).
    SeriesId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(CallId::new(), CallId::new());
        assert_ne!(GroupSessionId::new(), GroupSessionId::new());
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn display_matches_uuid_format() {
        let uuid = Uuid::new_v4();
        let id = PurchaseId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn parses_from_string() {
        let uuid = Uuid::new_v4();
        let id: GroupSessionId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn rejects_invalid_string() {
        assert!("not-a-uuid".parse::<CallId>().is_err());
    }

    #[test]
    fn serializes_transparently() {
        let uuid = Uuid::new_v4();
        let id = SeriesId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
