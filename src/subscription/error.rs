//! Subscription-specific error types.
//!
//! Granular errors for the action gateway and collaborators, convertible
//! to `WayfarerError` for transport-level consumers. The taxonomy has
//! four families: local precondition violations (no network call was
//! made), collaborator rejections, transient transport failures, and the
//! one fatal case, entitlement desync after a mutation.

use std::fmt;

use crate::subscription::lifecycle::LifecycleState;
use crate::subscription::record::Plan;

/// Subscription domain errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    // Precondition violations, rejected locally
    /// No access token is present; mutations short-circuit before any
    /// network call.
    NotAuthenticated,
    /// No subscription record exists to act on.
    NoSubscription,
    /// Another mutating action is already in flight for this
    /// subscription.
    ActionInProgress,
    /// Cancellation is not legal from the current state.
    CancelNotAllowed { state: LifecycleState },
    /// A cancellation is already scheduled; carries the server's own
    /// message when the rejection came from billing.
    CancellationAlreadyScheduled { message: String },
    /// Reactivation is only legal for an end-of-period cancellation that
    /// has not yet expired.
    ReactivateNotAllowed { state: LifecycleState },
    /// The cancellation's `end_date` has already passed.
    ReactivationWindowPassed,
    /// Plan changes are only legal from a fully active subscription.
    PlanChangeNotAllowed { state: LifecycleState },
    /// The requested plan is the current plan.
    SamePlan { plan: Plan },
    /// The requested plan is not a user-selectable target.
    PlanNotSwitchable { plan: Plan },
    /// Refunds are not legal from the current state.
    RefundNotAllowed { state: LifecycleState },
    /// The refund window has closed or eligibility could not be
    /// confirmed.
    RefundNotEligible { reason: String },

    // Collaborator rejection
    /// The billing or auth service rejected the request.
    Collaborator {
        operation: String,
        message: String,
        http_status: Option<u16>,
    },

    // Transient failure
    /// The collaborator could not be reached; state is unchanged and the
    /// user may retry manually.
    Transport { operation: String, message: String },

    // Fatal
    /// The post-mutation token refresh was rejected: displayed
    /// entitlement can no longer be trusted and the session must
    /// reconnect.
    ReconnectRequired,
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => {
                write!(f, "Not signed in")
            }
            Self::NoSubscription => {
                write!(f, "No subscription found")
            }
            Self::ActionInProgress => {
                write!(f, "Another subscription action is already in progress")
            }
            Self::CancelNotAllowed { state } => {
                write!(f, "Cannot cancel a subscription in state '{}'", state)
            }
            Self::CancellationAlreadyScheduled { message } => {
                write!(f, "{}", message)
            }
            Self::ReactivateNotAllowed { state } => {
                write!(f, "Cannot reactivate a subscription in state '{}'", state)
            }
            Self::ReactivationWindowPassed => {
                write!(f, "This subscription has already expired and cannot be reactivated")
            }
            Self::PlanChangeNotAllowed { state } => {
                write!(f, "Cannot change plan of a subscription in state '{}'", state)
            }
            Self::SamePlan { plan } => {
                write!(f, "Already on the {} plan", plan.display_name())
            }
            Self::PlanNotSwitchable { plan } => {
                write!(f, "Plan '{}' cannot be selected", plan)
            }
            Self::RefundNotAllowed { state } => {
                write!(f, "Cannot request a refund in state '{}'", state)
            }
            Self::RefundNotEligible { reason } => {
                write!(f, "Refund not available: {}", reason)
            }
            Self::Collaborator { operation, message, http_status } => {
                write!(f, "Billing service rejected '{}': {}", operation, message)?;
                if let Some(status) = http_status {
                    write!(f, " [HTTP {}]", status)?;
                }
                Ok(())
            }
            Self::Transport { operation, message } => {
                write!(f, "Could not reach the billing service during '{}': {}", operation, message)
            }
            Self::ReconnectRequired => {
                write!(f, "Session out of sync, please reconnect")
            }
        }
    }
}

impl std::error::Error for SubscriptionError {}

impl SubscriptionError {
    /// Whether this error was rejected locally, before any network call.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::NoSubscription
                | Self::ActionInProgress
                | Self::CancelNotAllowed { .. }
                | Self::ReactivateNotAllowed { .. }
                | Self::ReactivationWindowPassed
                | Self::PlanChangeNotAllowed { .. }
                | Self::SamePlan { .. }
                | Self::PlanNotSwitchable { .. }
                | Self::RefundNotAllowed { .. }
                | Self::RefundNotEligible { .. }
        )
    }

    /// Whether the user may sensibly re-invoke the action manually.
    /// Nothing is ever retried automatically.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether this error invalidates the session's entitlement display.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReconnectRequired)
    }
}

impl From<SubscriptionError> for crate::error::WayfarerError {
    fn from(err: SubscriptionError) -> Self {
        match &err {
            SubscriptionError::NotAuthenticated | SubscriptionError::ReconnectRequired => {
                crate::error::WayfarerError::Unauthorized(err.to_string())
            }

            SubscriptionError::NoSubscription => {
                crate::error::WayfarerError::NotFound(err.to_string())
            }

            SubscriptionError::ActionInProgress
            | SubscriptionError::CancellationAlreadyScheduled { .. } => {
                crate::error::WayfarerError::Conflict(err.to_string())
            }

            SubscriptionError::CancelNotAllowed { .. }
            | SubscriptionError::ReactivateNotAllowed { .. }
            | SubscriptionError::ReactivationWindowPassed
            | SubscriptionError::PlanChangeNotAllowed { .. }
            | SubscriptionError::RefundNotAllowed { .. }
            | SubscriptionError::RefundNotEligible { .. } => {
                crate::error::WayfarerError::Forbidden(err.to_string())
            }

            SubscriptionError::SamePlan { .. } | SubscriptionError::PlanNotSwitchable { .. } => {
                crate::error::WayfarerError::BadRequest(err.to_string())
            }

            SubscriptionError::Collaborator { http_status, .. } => match http_status {
                Some(400..=499) => crate::error::WayfarerError::BadRequest(err.to_string()),
                _ => crate::error::WayfarerError::Internal(err.to_string()),
            },

            SubscriptionError::Transport { .. } => {
                crate::error::WayfarerError::ServiceUnavailable(err.to_string())
            }
        }
    }
}
