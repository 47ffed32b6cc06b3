//! Canonical lifecycle classification.
//!
//! Four independent signals (status, the entitlement flag, the
//! cancellation mode, and the refund marker) reconcile into exactly one
//! state. Every UI and gating decision downstream keys off this value;
//! nothing else re-derives it from the raw fields.

use crate::subscription::record::{CancelationType, SubscriptionRecord, SubscriptionStatus};

/// The six-way canonical classification of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No subscription record exists.
    NoSubscription,
    /// Active, entitled, no cancellation requested.
    FullyActive,
    /// Canceled but entitled until `end_date`.
    CanceledEndOfPeriod,
    /// Refunded with immediate cancellation; access revoked.
    CanceledImmediateRefunded,
    /// Canceled and no longer entitled.
    Expired,
    /// A combination of signals this model does not recognize.
    Unexpected,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSubscription => "no_subscription",
            Self::FullyActive => "fully_active",
            Self::CanceledEndOfPeriod => "canceled_end_of_period",
            Self::CanceledImmediateRefunded => "canceled_immediate_refunded",
            Self::Expired => "expired",
            Self::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a subscription record into its lifecycle state.
///
/// Total and pure: every input maps to exactly one state, and anything
/// the arms below do not recognize lands in `Unexpected` so the caller
/// always has something safe to render.
#[must_use]
pub fn classify(record: Option<&SubscriptionRecord>) -> LifecycleState {
    use CancelationType::{EndOfPeriod, Immediate};
    use SubscriptionStatus::{Active, Canceled};

    let Some(r) = record else {
        return LifecycleState::NoSubscription;
    };

    match (r.status, r.is_active, r.cancelation_type) {
        (Active, true, None) => LifecycleState::FullyActive,
        (Canceled, true, Some(EndOfPeriod)) => LifecycleState::CanceledEndOfPeriod,
        (Canceled, true, Some(Immediate)) => LifecycleState::CanceledImmediateRefunded,
        // Billing may leave status=active after processing an immediate
        // refund; the refund marker wins. Delete this arm once the
        // billing service transitions status atomically with the refund.
        (Active, _, Some(Immediate)) if r.has_refund() => {
            LifecycleState::CanceledImmediateRefunded
        }
        (Canceled, false, _) => LifecycleState::Expired,
        _ => LifecycleState::Unexpected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::record::Plan;

    fn record(
        status: SubscriptionStatus,
        is_active: bool,
        cancelation_type: Option<CancelationType>,
    ) -> SubscriptionRecord {
        SubscriptionRecord {
            id: "sub_1".to_string(),
            plan: Plan::Monthly,
            status,
            is_active,
            start_date: 1_700_000_000,
            end_date: None,
            cancelation_type,
            refund_status: None,
            days_remaining: None,
            payment_method: None,
        }
    }

    #[test]
    fn test_no_record_is_no_subscription() {
        assert_eq!(classify(None), LifecycleState::NoSubscription);
    }

    #[test]
    fn test_fully_active() {
        let r = record(SubscriptionStatus::Active, true, None);
        assert_eq!(classify(Some(&r)), LifecycleState::FullyActive);
    }

    #[test]
    fn test_canceled_end_of_period() {
        let r = record(SubscriptionStatus::Canceled, true, Some(CancelationType::EndOfPeriod));
        assert_eq!(classify(Some(&r)), LifecycleState::CanceledEndOfPeriod);
    }

    #[test]
    fn test_canceled_immediate_refunded() {
        let r = record(SubscriptionStatus::Canceled, true, Some(CancelationType::Immediate));
        assert_eq!(classify(Some(&r)), LifecycleState::CanceledImmediateRefunded);
    }

    #[test]
    fn test_active_with_processed_refund_is_refunded() {
        let mut r = record(SubscriptionStatus::Active, true, Some(CancelationType::Immediate));
        r.refund_status = Some("processed".to_string());
        assert_eq!(classify(Some(&r)), LifecycleState::CanceledImmediateRefunded);

        // The refund marker also wins when the entitlement flag has
        // already been dropped.
        r.is_active = false;
        assert_eq!(classify(Some(&r)), LifecycleState::CanceledImmediateRefunded);
    }

    #[test]
    fn test_active_immediate_without_refund_is_unexpected() {
        let r = record(SubscriptionStatus::Active, true, Some(CancelationType::Immediate));
        assert_eq!(classify(Some(&r)), LifecycleState::Unexpected);
    }

    #[test]
    fn test_expired_regardless_of_other_fields() {
        let mut r = record(SubscriptionStatus::Canceled, false, None);
        assert_eq!(classify(Some(&r)), LifecycleState::Expired);

        r.cancelation_type = Some(CancelationType::EndOfPeriod);
        assert_eq!(classify(Some(&r)), LifecycleState::Expired);

        r.cancelation_type = Some(CancelationType::Immediate);
        r.refund_status = Some("processed".to_string());
        assert_eq!(classify(Some(&r)), LifecycleState::Expired);
    }

    #[test]
    fn test_unmodeled_statuses_are_unexpected() {
        for status in [
            SubscriptionStatus::Suspended,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::Other,
        ] {
            let r = record(status, true, None);
            assert_eq!(classify(Some(&r)), LifecycleState::Unexpected, "{}", status);
        }

        // Inactive-but-not-canceled is not a modeled combination either.
        let r = record(SubscriptionStatus::Active, false, None);
        assert_eq!(classify(Some(&r)), LifecycleState::Unexpected);
    }

    #[test]
    fn test_classification_is_deterministic_and_total() {
        let statuses = [
            SubscriptionStatus::Active,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Suspended,
            SubscriptionStatus::Trialing,
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::Other,
        ];
        let cancelations = [None, Some(CancelationType::Immediate), Some(CancelationType::EndOfPeriod)];
        let refunds = [None, Some("processed".to_string())];

        for status in statuses {
            for is_active in [true, false] {
                for cancelation in cancelations {
                    for refund in &refunds {
                        let mut r = record(status, is_active, cancelation);
                        r.refund_status = refund.clone();
                        let first = classify(Some(&r));
                        let second = classify(Some(&r));
                        assert_eq!(first, second);
                    }
                }
            }
        }
    }
}
