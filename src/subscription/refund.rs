//! Refund eligibility.
//!
//! Eligibility is a time-windowed function of the subscription start and
//! "now". It is recomputed on every panel load and after every mutation,
//! never cached across sessions, and never user-writable. When the
//! billing collaborator cannot confirm a verdict the check fails closed:
//! the answer is always ineligible.

use serde::{Deserialize, Serialize};

use crate::subscription::record::SubscriptionRecord;

/// Verdict on whether a full refund may currently be requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEligibility {
    pub eligible: bool,
    #[serde(rename = "daysSinceStart", default)]
    pub days_since_start: u32,
    #[serde(rename = "daysRemainingForRefund", default)]
    pub days_remaining_for_refund: u32,
    #[serde(rename = "maxRefundDays", default)]
    pub max_refund_days: u32,
    /// Human-readable explanation when not eligible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RefundEligibility {
    /// The fail-closed verdict used whenever the billing collaborator
    /// cannot be reached to confirm eligibility.
    #[must_use]
    pub fn verification_failed() -> Self {
        Self {
            eligible: false,
            days_since_start: 0,
            days_remaining_for_refund: 0,
            max_refund_days: 0,
            reason: Some("verification failed".to_string()),
        }
    }
}

/// Compute refund eligibility for a record at a given instant.
///
/// Only meaningful when the lifecycle state is `FullyActive` or
/// `CanceledEndOfPeriod`; callers must not surface refund UI in any
/// other state.
#[must_use]
pub fn check_eligibility(
    record: &SubscriptionRecord,
    now: u64,
    max_refund_days: u32,
) -> RefundEligibility {
    let days_since_start = record.days_since_start(now);
    let days_remaining_for_refund = max_refund_days.saturating_sub(days_since_start);
    let eligible = days_since_start <= max_refund_days;

    let reason = if eligible {
        None
    } else {
        Some(format!(
            "The {}-day refund window ended {} days ago",
            max_refund_days,
            days_since_start - max_refund_days
        ))
    };

    RefundEligibility {
        eligible,
        days_since_start,
        days_remaining_for_refund,
        max_refund_days,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::record::{Plan, SubscriptionStatus};

    const DAY: u64 = 86_400;

    fn record_started_at(start: u64) -> SubscriptionRecord {
        SubscriptionRecord {
            id: "sub_1".to_string(),
            plan: Plan::Monthly,
            status: SubscriptionStatus::Active,
            is_active: true,
            start_date: start,
            end_date: None,
            cancelation_type: None,
            refund_status: None,
            days_remaining: None,
            payment_method: None,
        }
    }

    #[test]
    fn test_within_window() {
        let start = 1_700_000_000;
        let record = record_started_at(start);

        let verdict = check_eligibility(&record, start + 5 * DAY, 14);
        assert!(verdict.eligible);
        assert_eq!(verdict.days_since_start, 5);
        assert_eq!(verdict.days_remaining_for_refund, 9);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_twenty_days_in_with_fourteen_day_window() {
        let start = 1_700_000_000;
        let record = record_started_at(start);

        let verdict = check_eligibility(&record, start + 20 * DAY, 14);
        assert!(!verdict.eligible);
        assert_eq!(verdict.days_remaining_for_refund, 0);
        assert!(verdict.reason.unwrap().contains("refund window"));
    }

    #[test]
    fn test_boundary_day_is_still_eligible() {
        let start = 1_700_000_000;
        let record = record_started_at(start);

        // Exactly max_refund_days elapsed: still inside the window.
        let verdict = check_eligibility(&record, start + 14 * DAY, 14);
        assert!(verdict.eligible);
        assert_eq!(verdict.days_remaining_for_refund, 0);

        let verdict = check_eligibility(&record, start + 15 * DAY, 14);
        assert!(!verdict.eligible);
    }

    #[test]
    fn test_monotonic_in_now() {
        let start = 1_700_000_000;
        let record = record_started_at(start);

        let mut last_remaining = u32::MAX;
        let mut went_ineligible = false;
        for day in 0..40 {
            let verdict = check_eligibility(&record, start + day * DAY, 14);
            assert!(verdict.days_remaining_for_refund <= last_remaining);
            last_remaining = verdict.days_remaining_for_refund;

            if went_ineligible {
                assert!(!verdict.eligible, "eligibility must not come back on day {}", day);
            }
            went_ineligible = !verdict.eligible;
        }
    }

    #[test]
    fn test_clock_before_start_saturates() {
        let start = 1_700_000_000;
        let record = record_started_at(start);

        let verdict = check_eligibility(&record, start - 3 * DAY, 14);
        assert!(verdict.eligible);
        assert_eq!(verdict.days_since_start, 0);
        assert_eq!(verdict.days_remaining_for_refund, 14);
    }

    #[test]
    fn test_verification_failed_is_closed() {
        let verdict = RefundEligibility::verification_failed();
        assert!(!verdict.eligible);
        assert_eq!(verdict.reason.as_deref(), Some("verification failed"));
    }

    #[test]
    fn test_deserializes_collaborator_payload() {
        let json = r#"{
            "eligible": true,
            "daysSinceStart": 3,
            "daysRemainingForRefund": 11,
            "maxRefundDays": 14
        }"#;
        let verdict: RefundEligibility = serde_json::from_str(json).unwrap();
        assert!(verdict.eligible);
        assert_eq!(verdict.days_remaining_for_refund, 11);
    }
}
