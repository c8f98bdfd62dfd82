//! Payment processor webhook event types.
//!
//! Defines the structures for parsing completed-checkout payloads. Only
//! fields relevant to our processing are captured; the processor's full
//! event schema is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::foundation::{
    CallId, GroupSessionId, Money, RecordingId, SeriesId, Timestamp, UserId,
};

use super::WebhookError;

/// Event type string for a completed checkout.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Payment processor webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: CheckoutEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: String,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutEventData {
    /// The object that triggered the event (a checkout session for the
    /// events we process).
    pub object: serde_json::Value,
}

impl CheckoutEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Returns true for the one event type the router processes.
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_COMPLETED
    }

    /// Extracts and validates the purchase metadata the router dispatches on.
    pub fn purchase_metadata(&self) -> Result<CheckoutMetadata, WebhookError> {
        CheckoutMetadata::from_object(&self.data.object)
    }
}

/// Purpose tag embedded in a checkout event, indicating which domain handler
/// should process it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    /// Single recording purchase.
    Recording,
    /// Recording series (bundle) purchase.
    Series,
    /// One-on-one call payment.
    Call,
    /// Group-session seat payment.
    GroupSession,
}

impl PurchaseKind {
    /// Parses the metadata purpose tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "recording" => Some(PurchaseKind::Recording),
            "series" => Some(PurchaseKind::Series),
            "call" => Some(PurchaseKind::Call),
            "group_session" => Some(PurchaseKind::GroupSession),
            _ => None,
        }
    }

    /// The metadata tag string.
    pub fn as_tag(&self) -> &'static str {
        match self {
            PurchaseKind::Recording => "recording",
            PurchaseKind::Series => "series",
            PurchaseKind::Call => "call",
            PurchaseKind::GroupSession => "group_session",
        }
    }
}

impl fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// What a checkout paid for, resolved from the purpose tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseDetail {
    Recording {
        recording_id: RecordingId,
    },
    Series {
        series_id: SeriesId,
    },
    Call {
        call_id: CallId,
        mentor_id: UserId,
        scheduled_at: Timestamp,
        duration_minutes: u32,
    },
    GroupSession {
        session_id: GroupSessionId,
    },
}

impl PurchaseDetail {
    /// The purpose tag this detail came from.
    pub fn kind(&self) -> PurchaseKind {
        match self {
            PurchaseDetail::Recording { .. } => PurchaseKind::Recording,
            PurchaseDetail::Series { .. } => PurchaseKind::Series,
            PurchaseDetail::Call { .. } => PurchaseKind::Call,
            PurchaseDetail::GroupSession { .. } => PurchaseKind::GroupSession,
        }
    }
}

/// Validated purchase metadata extracted from a checkout event.
///
/// The processor sends the metadata bag as strings; everything here has been
/// parsed into domain types. A missing or malformed required field is an
/// integrity error (`WebhookError::MissingMetadata`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    /// Buyer.
    pub user_id: UserId,

    /// What was bought.
    pub detail: PurchaseDetail,

    /// Gross amount in minor units.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Processor payment reference (used for refunds).
    pub payment_reference: Option<String>,
}

impl CheckoutMetadata {
    /// Parses the checkout session object's metadata bag.
    pub fn from_object(object: &serde_json::Value) -> Result<Self, WebhookError> {
        let metadata: HashMap<String, String> = object
            .get("metadata")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| WebhookError::MissingMetadata(format!("metadata bag: {}", e)))?
            .ok_or_else(|| WebhookError::MissingMetadata("metadata bag absent".to_string()))?;

        let purpose_tag = require(&metadata, "purpose")?;
        let kind = PurchaseKind::from_tag(purpose_tag).ok_or_else(|| {
            WebhookError::MissingMetadata(format!("unknown purpose tag '{}'", purpose_tag))
        })?;

        let user_id = parse_field::<UserId>(&metadata, "user_id")?;

        let detail = match kind {
            PurchaseKind::Recording => PurchaseDetail::Recording {
                recording_id: parse_field(&metadata, "recording_id")?,
            },
            PurchaseKind::Series => PurchaseDetail::Series {
                series_id: parse_field(&metadata, "series_id")?,
            },
            PurchaseKind::Call => {
                let scheduled_at_raw = require(&metadata, "scheduled_at")?;
                let scheduled_at = chrono::DateTime::parse_from_rfc3339(scheduled_at_raw)
                    .map_err(|e| {
                        WebhookError::MissingMetadata(format!("scheduled_at: {}", e))
                    })?
                    .with_timezone(&chrono::Utc);
                let duration_minutes: u32 = require(&metadata, "duration_minutes")?
                    .parse()
                    .map_err(|_| {
                        WebhookError::MissingMetadata("duration_minutes not a number".to_string())
                    })?;
                PurchaseDetail::Call {
                    call_id: parse_field(&metadata, "call_id")?,
                    mentor_id: parse_field(&metadata, "mentor_id")?,
                    scheduled_at: Timestamp::from_datetime(scheduled_at),
                    duration_minutes,
                }
            }
            PurchaseKind::GroupSession => PurchaseDetail::GroupSession {
                session_id: parse_field(&metadata, "session_id")?,
            },
        };

        let amount = object
            .get("amount_total")
            .and_then(|v| v.as_i64())
            .map(Money::from_cents)
            .ok_or_else(|| WebhookError::MissingMetadata("amount_total absent".to_string()))?;

        let currency = object
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or("usd")
            .to_string();

        let payment_reference = object
            .get("payment_intent")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Self {
            user_id,
            detail,
            amount,
            currency,
            payment_reference,
        })
    }
}

fn require<'a>(
    metadata: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, WebhookError> {
    metadata
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WebhookError::MissingMetadata(format!("required field '{}'", key)))
}

fn parse_field<T: std::str::FromStr>(
    metadata: &HashMap<String, String>,
    key: &str,
) -> Result<T, WebhookError> {
    require(metadata, key)?
        .parse()
        .map_err(|_| WebhookError::MissingMetadata(format!("field '{}' is malformed", key)))
}

/// Builder for creating checkout events in tests and fixtures.
pub struct CheckoutEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    metadata: HashMap<String, String>,
    amount_total: i64,
    currency: String,
    payment_intent: Option<String>,
    livemode: bool,
}

impl CheckoutEventBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event_type: CHECKOUT_COMPLETED.to_string(),
            created: 1_717_408_800,
            metadata: HashMap::new(),
            amount_total: 0,
            currency: "usd".to_string(),
            payment_intent: None,
            livemode: false,
        }
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn amount_total(mut self, cents: i64) -> Self {
        self.amount_total = cents;
        self
    }

    pub fn payment_intent(mut self, reference: impl Into<String>) -> Self {
        self.payment_intent = Some(reference.into());
        self
    }

    pub fn build(self) -> CheckoutEvent {
        let mut object = serde_json::json!({
            "metadata": self.metadata,
            "amount_total": self.amount_total,
            "currency": self.currency,
        });
        if let Some(reference) = self.payment_intent {
            object["payment_intent"] = serde_json::Value::String(reference);
        }
        CheckoutEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: CheckoutEventData { object },
            livemode: self.livemode,
            api_version: "2023-10-16".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_event() -> CheckoutEvent {
        CheckoutEventBuilder::new("evt_rec_1")
            .metadata("purpose", "recording")
            .metadata("user_id", UserId::new().to_string())
            .metadata("recording_id", RecordingId::new().to_string())
            .amount_total(1_500)
            .payment_intent("pi_123")
            .build()
    }

    #[test]
    fn parses_recording_purchase_metadata() {
        let event = recording_event();
        assert!(event.is_checkout_completed());

        let meta = event.purchase_metadata().unwrap();
        assert_eq!(meta.detail.kind(), PurchaseKind::Recording);
        assert_eq!(meta.amount, Money::from_cents(1_500));
        assert_eq!(meta.currency, "usd");
        assert_eq!(meta.payment_reference.as_deref(), Some("pi_123"));
    }

    #[test]
    fn parses_call_purchase_metadata() {
        let mentor = UserId::new();
        let call = CallId::new();
        let event = CheckoutEventBuilder::new("evt_call_1")
            .metadata("purpose", "call")
            .metadata("user_id", UserId::new().to_string())
            .metadata("call_id", call.to_string())
            .metadata("mentor_id", mentor.to_string())
            .metadata("scheduled_at", "2024-06-10T09:00:00Z")
            .metadata("duration_minutes", "30")
            .amount_total(5_000)
            .build();

        let meta = event.purchase_metadata().unwrap();
        match meta.detail {
            PurchaseDetail::Call {
                call_id,
                mentor_id,
                scheduled_at,
                duration_minutes,
            } => {
                assert_eq!(call_id, call);
                assert_eq!(mentor_id, mentor);
                assert_eq!(scheduled_at.as_unix_secs(), 1_718_010_000);
                assert_eq!(duration_minutes, 30);
            }
            other => panic!("expected call detail, got {:?}", other),
        }
    }

    #[test]
    fn parses_group_session_purchase_metadata() {
        let session = GroupSessionId::new();
        let event = CheckoutEventBuilder::new("evt_gs_1")
            .metadata("purpose", "group_session")
            .metadata("user_id", UserId::new().to_string())
            .metadata("session_id", session.to_string())
            .amount_total(2_500)
            .build();

        let meta = event.purchase_metadata().unwrap();
        assert_eq!(
            meta.detail,
            PurchaseDetail::GroupSession { session_id: session }
        );
    }

    #[test]
    fn missing_purpose_is_an_integrity_error() {
        let event = CheckoutEventBuilder::new("evt_bad_1")
            .metadata("user_id", UserId::new().to_string())
            .amount_total(1_000)
            .build();

        assert!(matches!(
            event.purchase_metadata(),
            Err(WebhookError::MissingMetadata(_))
        ));
    }

    #[test]
    fn unknown_purpose_tag_is_rejected() {
        let event = CheckoutEventBuilder::new("evt_bad_2")
            .metadata("purpose", "subscription")
            .metadata("user_id", UserId::new().to_string())
            .amount_total(1_000)
            .build();

        assert!(matches!(
            event.purchase_metadata(),
            Err(WebhookError::MissingMetadata(_))
        ));
    }

    #[test]
    fn malformed_target_id_is_rejected() {
        let event = CheckoutEventBuilder::new("evt_bad_3")
            .metadata("purpose", "recording")
            .metadata("user_id", UserId::new().to_string())
            .metadata("recording_id", "not-a-uuid")
            .amount_total(1_000)
            .build();

        assert!(matches!(
            event.purchase_metadata(),
            Err(WebhookError::MissingMetadata(_))
        ));
    }

    #[test]
    fn call_metadata_requires_scheduling_fields() {
        let event = CheckoutEventBuilder::new("evt_bad_4")
            .metadata("purpose", "call")
            .metadata("user_id", UserId::new().to_string())
            .metadata("call_id", CallId::new().to_string())
            .metadata("mentor_id", UserId::new().to_string())
            .amount_total(5_000)
            .build();

        assert!(matches!(
            event.purchase_metadata(),
            Err(WebhookError::MissingMetadata(_))
        ));
    }

    #[test]
    fn purpose_tags_roundtrip() {
        for kind in [
            PurchaseKind::Recording,
            PurchaseKind::Series,
            PurchaseKind::Call,
            PurchaseKind::GroupSession,
        ] {
            assert_eq!(PurchaseKind::from_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(PurchaseKind::from_tag("unknown"), None);
    }

    #[test]
    fn non_checkout_event_types_are_detectable() {
        let event = CheckoutEventBuilder::new("evt_other")
            .event_type("invoice.paid")
            .build();
        assert!(!event.is_checkout_completed());
    }
}
