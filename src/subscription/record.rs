//! The subscription record as returned by the billing collaborator.
//!
//! The record is a snapshot: immutable once fetched, replaced wholesale
//! after every mutation. All timestamps are Unix seconds.

use serde::{Deserialize, Serialize};

/// Seconds in a day, for day-granularity arithmetic.
const DAY_SECS: u64 = 86_400;

/// Current Unix time in seconds.
#[must_use]
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Monthly,
    Annual,
    Premium,
}

impl Plan {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Monthly => "monthly",
            Self::Annual => "annual",
            Self::Premium => "premium",
        }
    }

    /// Human-readable plan name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Monthly => "Monthly",
            Self::Annual => "Annual",
            Self::Premium => "Premium",
        }
    }

    /// Whether this plan is a valid target of a user-initiated plan
    /// change. Only the monthly/annual pair is switchable; `free` and
    /// `premium` are assigned by other flows.
    #[must_use]
    pub fn is_switchable(&self) -> bool {
        matches!(self, Self::Monthly | Self::Annual)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription status as reported by billing.
///
/// `Other` absorbs any status string the billing service emits that this
/// enum does not model, so deserialization never fails and classification
/// stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Suspended,
    Trialing,
    Incomplete,
    #[serde(other)]
    Other,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Suspended => "suspended",
            Self::Trialing => "trialing",
            Self::Incomplete => "incomplete",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a requested cancellation takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelationType {
    /// Access revoked now (refund path).
    Immediate,
    /// Access kept until `end_date`.
    EndOfPeriod,
}

/// A subscription as returned by the billing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Opaque record identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Current plan.
    pub plan: Plan,
    /// Raw billing status.
    pub status: SubscriptionStatus,
    /// Whether premium entitlement is currently granted. Authoritative
    /// over `status` for access decisions.
    #[serde(rename = "isActive")]
    pub is_active: bool,
    /// Subscription start (Unix seconds). Immutable once set.
    #[serde(rename = "startDate")]
    pub start_date: u64,
    /// When entitlement will cease, if a cancellation or expiry is set.
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<u64>,
    /// Present only while a cancellation has been requested.
    #[serde(rename = "cancelationType", default, skip_serializing_if = "Option::is_none")]
    pub cancelation_type: Option<CancelationType>,
    /// Non-empty once a refund has been processed.
    #[serde(rename = "refundStatus", default, skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<String>,
    /// Server-derived days until `end_date`.
    #[serde(rename = "daysRemaining", default, skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<u32>,
    /// Display string for the payment method on file.
    #[serde(rename = "paymentMethod", default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl SubscriptionRecord {
    /// Whether premium entitlement is granted right now.
    ///
    /// `is_active == false` always means no entitlement, whatever
    /// `status` reads; a processed refund revokes access even while
    /// `status` still reads `active`.
    #[must_use]
    pub fn is_entitled(&self) -> bool {
        if !self.is_active {
            return false;
        }
        !(self.cancelation_type == Some(CancelationType::Immediate) && self.has_refund())
    }

    /// Whether a refund has been processed for this subscription.
    ///
    /// The billing service encodes "no refund" either as an absent field
    /// or as the literal string `none`.
    #[must_use]
    pub fn has_refund(&self) -> bool {
        match self.refund_status.as_deref() {
            Some("") | Some("none") | None => false,
            Some(_) => true,
        }
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.status == SubscriptionStatus::Canceled
    }

    /// Whole days elapsed since the subscription started.
    #[must_use]
    pub fn days_since_start(&self, now: u64) -> u32 {
        (now.saturating_sub(self.start_date) / DAY_SECS) as u32
    }

    /// Days of entitlement remaining, preferring the server-derived
    /// count and falling back to `end_date` arithmetic.
    #[must_use]
    pub fn remaining_days(&self, now: u64) -> Option<u32> {
        if let Some(days) = self.days_remaining {
            return Some(days);
        }
        self.end_date
            .map(|end| (end.saturating_sub(now) / DAY_SECS) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_record() {
        let json = r#"{
            "_id": "sub_42",
            "plan": "monthly",
            "status": "canceled",
            "isActive": true,
            "startDate": 1700000000,
            "endDate": 1702592000,
            "cancelationType": "end_of_period",
            "daysRemaining": 10,
            "paymentMethod": "Visa ****4242"
        }"#;

        let record: SubscriptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "sub_42");
        assert_eq!(record.plan, Plan::Monthly);
        assert_eq!(record.status, SubscriptionStatus::Canceled);
        assert!(record.is_active);
        assert_eq!(record.cancelation_type, Some(CancelationType::EndOfPeriod));
        assert_eq!(record.days_remaining, Some(10));
        assert!(record.refund_status.is_none());
    }

    #[test]
    fn test_unknown_status_does_not_fail_parse() {
        let json = r#"{
            "_id": "sub_1",
            "plan": "annual",
            "status": "past_due",
            "isActive": false,
            "startDate": 1700000000
        }"#;

        let record: SubscriptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Other);
    }

    #[test]
    fn test_has_refund_treats_none_literal_as_absent() {
        let mut record = fixture();
        assert!(!record.has_refund());

        record.refund_status = Some("none".to_string());
        assert!(!record.has_refund());

        record.refund_status = Some(String::new());
        assert!(!record.has_refund());

        record.refund_status = Some("processed".to_string());
        assert!(record.has_refund());
    }

    #[test]
    fn test_entitlement_revoked_by_refund() {
        let mut record = fixture();
        assert!(record.is_entitled());

        record.cancelation_type = Some(CancelationType::Immediate);
        record.refund_status = Some("processed".to_string());
        assert!(!record.is_entitled());

        // isActive=false always wins, whatever else is set.
        let mut record = fixture();
        record.is_active = false;
        assert!(!record.is_entitled());
    }

    #[test]
    fn test_day_arithmetic_saturates() {
        let record = fixture();
        // Clock before start: zero days, never a panic or underflow.
        assert_eq!(record.days_since_start(record.start_date - 100), 0);
        assert_eq!(record.days_since_start(record.start_date + 20 * 86_400), 20);
    }

    #[test]
    fn test_remaining_days_prefers_server_value() {
        let mut record = fixture();
        record.end_date = Some(record.start_date + 30 * 86_400);
        record.days_remaining = Some(7);
        assert_eq!(record.remaining_days(record.start_date), Some(7));

        record.days_remaining = None;
        assert_eq!(record.remaining_days(record.start_date), Some(30));

        record.end_date = None;
        assert_eq!(record.remaining_days(record.start_date), None);
    }

    pub(crate) fn fixture() -> SubscriptionRecord {
        SubscriptionRecord {
            id: "sub_1".to_string(),
            plan: Plan::Monthly,
            status: SubscriptionStatus::Active,
            is_active: true,
            start_date: 1_700_000_000,
            end_date: None,
            cancelation_type: None,
            refund_status: None,
            days_remaining: None,
            payment_method: None,
        }
    }
}
