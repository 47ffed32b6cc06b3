//! View selection for the premium-access panel.
//!
//! A pure mapping from the classifier's output (plus the eligibility
//! verdict) to a view descriptor. The page layer renders the descriptor
//! verbatim; which actions are enabled is decided here and nowhere else.

use crate::subscription::lifecycle::{classify, LifecycleState};
use crate::subscription::record::{SubscriptionRecord, SubscriptionStatus};
use crate::subscription::refund::RefundEligibility;

/// Which panel card to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Invitation to discover the premium plans.
    NoSubscription,
    /// Active-subscription management card.
    Active,
    /// Canceled but entitled until expiry.
    CanceledPendingExpiry,
    /// Refund processed, access revoked.
    Refunded,
    /// Entitlement lapsed.
    Expired,
    /// Diagnostic card for unrecognized states. Renders raw record
    /// fields; never crashes.
    Unexpected,
}

/// An action button the panel may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    GoPremium,
    Cancel,
    Reactivate,
    ChangePlan,
    RequestRefund,
    Resubscribe,
    ViewPaymentHistory,
}

/// Everything the page layer needs to render the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub kind: ViewKind,
    /// Badge text next to the title, when the card carries one.
    pub badge: Option<&'static str>,
    /// Enabled actions, in display order.
    pub actions: Vec<ActionKind>,
}

/// Choose the panel view for a record and eligibility verdict.
///
/// Pure: recompute after every mutation, never cache across syncs.
#[must_use]
pub fn select_view(
    record: Option<&SubscriptionRecord>,
    eligibility: Option<&RefundEligibility>,
) -> PanelView {
    let refund_available = eligibility.map(|e| e.eligible).unwrap_or(false);

    match classify(record) {
        LifecycleState::NoSubscription => PanelView {
            kind: ViewKind::NoSubscription,
            badge: None,
            actions: vec![ActionKind::GoPremium],
        },
        LifecycleState::FullyActive => {
            let mut actions = vec![ActionKind::ChangePlan, ActionKind::Cancel];
            if refund_available {
                actions.push(ActionKind::RequestRefund);
            }
            PanelView {
                kind: ViewKind::Active,
                badge: Some("Active"),
                actions,
            }
        }
        LifecycleState::CanceledEndOfPeriod => {
            let mut actions = vec![ActionKind::Reactivate];
            if refund_available {
                actions.push(ActionKind::RequestRefund);
            }
            PanelView {
                kind: ViewKind::CanceledPendingExpiry,
                badge: Some("Expires soon"),
                actions,
            }
        }
        LifecycleState::CanceledImmediateRefunded => PanelView {
            kind: ViewKind::Refunded,
            badge: Some("Refunded"),
            actions: vec![ActionKind::Resubscribe, ActionKind::ViewPaymentHistory],
        },
        LifecycleState::Expired => PanelView {
            kind: ViewKind::Expired,
            badge: None,
            actions: vec![ActionKind::Resubscribe],
        },
        LifecycleState::Unexpected => PanelView {
            kind: ViewKind::Unexpected,
            badge: None,
            actions: Vec::new(),
        },
    }
}

/// One-line status summary for list rows and headers.
#[must_use]
pub fn status_line(record: Option<&SubscriptionRecord>, now: u64) -> String {
    let Some(record) = record else {
        return "No subscription".to_string();
    };

    match (record.status, record.is_active) {
        (SubscriptionStatus::Active, true) => "Active".to_string(),
        (SubscriptionStatus::Canceled, true) => match record.remaining_days(now) {
            Some(days) if days > 0 => {
                format!("Canceled (expires in {} day{})", days, if days > 1 { "s" } else { "" })
            }
            _ => "Canceled (expires soon)".to_string(),
        },
        (SubscriptionStatus::Canceled, false) => "Expired".to_string(),
        (status, _) => status.to_string(),
    }
}
