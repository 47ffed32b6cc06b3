//! Action gateway: validated, serialized subscription mutations.
//!
//! Every user-initiated action is validated against the current
//! lifecycle state before a single byte goes on the wire, runs under a
//! per-subscription mutation lock, and finishes by re-syncing role and
//! record from ground truth. A failed call leaves the snapshot untouched
//! and is never retried automatically: re-invoking a cancellation or
//! refund risks duplicate billing effects.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::auth::client::AuthClient;
use crate::auth::context::{AuthorizationContext, Role};
use crate::auth::token::TokenStore;
use crate::billing::client::{BillingClient, RefundReceipt};
use crate::config::Config;
use crate::subscription::error::SubscriptionError;
use crate::subscription::lifecycle::{classify, LifecycleState};
use crate::subscription::record::{unix_now, Plan, SubscriptionRecord};
use crate::subscription::refund::RefundEligibility;
use crate::subscription::store::RecordStore;
use crate::subscription::sync::{EntitlementSynchronizer, SyncOutcome};

/// Result alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, SubscriptionError>;

/// Outcome of a reactivation or plan change.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Role on the freshly issued token.
    pub role: Role,
    /// Refetched record after the mutation.
    pub subscription: Option<SubscriptionRecord>,
}

/// Outcome of a cancellation.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub role: Role,
    pub subscription: Option<SubscriptionRecord>,
    /// The billing service's own message when it reported the
    /// cancellation as already scheduled (benign duplicate).
    pub server_message: Option<String>,
}

/// Outcome of a refund request.
#[derive(Debug, Clone)]
pub struct RefundOutcome {
    pub receipt: RefundReceipt,
    pub role: Role,
    pub subscription: Option<SubscriptionRecord>,
}

/// Releases the mutation lock when the action finishes, on every path.
struct MutationGuard<'a> {
    lock: &'a AtomicBool,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::Release);
    }
}

/// Gate for all mutating subscription actions.
///
/// Generic over the billing and auth collaborator seams so tests drive
/// it with the mock clients.
pub struct ActionGateway<B, A>
where
    B: BillingClient,
    A: AuthClient,
{
    sync: EntitlementSynchronizer<B, A>,
    tokens: TokenStore,
    lock: AtomicBool,
    max_refund_days: u32,
}

impl<B, A> ActionGateway<B, A>
where
    B: BillingClient,
    A: AuthClient,
{
    #[must_use]
    pub fn new(
        billing: B,
        auth: AuthorizationContext<A>,
        tokens: TokenStore,
        store: RecordStore,
        config: &Config,
    ) -> Self {
        Self {
            sync: EntitlementSynchronizer::new(billing, auth, store),
            tokens,
            lock: AtomicBool::new(false),
            max_refund_days: config.max_refund_days,
        }
    }

    /// The record store backing this gateway.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        self.sync.store()
    }

    /// The authorization context backing this gateway.
    #[must_use]
    pub fn auth(&self) -> &AuthorizationContext<A> {
        self.sync.auth()
    }

    /// Lifecycle state of the current snapshot.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        classify(self.store().snapshot().as_ref())
    }

    /// Fetch the subscription record and replace the snapshot.
    ///
    /// This is the panel-load path; it does not take the mutation lock.
    pub async fn load(&self) -> GatewayResult<Option<SubscriptionRecord>> {
        if !self.tokens.is_authenticated() {
            return Err(SubscriptionError::NotAuthenticated);
        }
        let record = self.sync.billing().get_current_subscription().await?;
        self.store().replace(record.clone());
        Ok(record)
    }

    /// Refund eligibility for the current snapshot, fail closed.
    ///
    /// Asks the billing collaborator for the authoritative verdict and
    /// returns the ineligible `verification failed` value on any
    /// transport problem. States outside `FullyActive` and
    /// `CanceledEndOfPeriod` are ineligible by definition.
    pub async fn refund_eligibility(&self) -> RefundEligibility {
        match self.state() {
            LifecycleState::FullyActive | LifecycleState::CanceledEndOfPeriod => {}
            state => {
                return RefundEligibility {
                    eligible: false,
                    days_since_start: 0,
                    days_remaining_for_refund: 0,
                    max_refund_days: self.max_refund_days,
                    reason: Some(format!("refund not available in state '{}'", state)),
                }
            }
        }

        match self.sync.billing().check_refund_eligibility().await {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(
                    target: "subscription.refund",
                    error = %err,
                    "Eligibility check failed; treating as ineligible"
                );
                RefundEligibility::verification_failed()
            }
        }
    }

    /// Local eligibility computed from the snapshot, for display only.
    /// The collaborator verdict from [`refund_eligibility`] gates the
    /// actual mutation.
    ///
    /// [`refund_eligibility`]: ActionGateway::refund_eligibility
    #[must_use]
    pub fn local_refund_eligibility(&self, record: &SubscriptionRecord) -> RefundEligibility {
        crate::subscription::refund::check_eligibility(record, unix_now(), self.max_refund_days)
    }

    /// Cancel the subscription.
    ///
    /// Legal only while fully active; a cancellation that is already
    /// scheduled is rejected locally. When billing itself reports the
    /// duplicate, the rejection is benign: state is refreshed and the
    /// server's message is passed through on the outcome.
    pub async fn cancel(&self, immediate: bool) -> GatewayResult<CancelOutcome> {
        let _guard = self.begin("cancel")?;

        let record = self.snapshot_or_err()?;
        match classify(Some(&record)) {
            LifecycleState::FullyActive => {}
            LifecycleState::CanceledEndOfPeriod => {
                return Err(SubscriptionError::CancellationAlreadyScheduled {
                    message: "A cancellation is already scheduled for this subscription"
                        .to_string(),
                })
            }
            state => return Err(SubscriptionError::CancelNotAllowed { state }),
        }

        match self.sync.billing().cancel(immediate).await {
            Ok(_) => {
                let SyncOutcome { role, subscription } = self.sync.sync().await?;
                tracing::info!(
                    target: "subscription.action",
                    immediate,
                    "Subscription canceled"
                );
                Ok(CancelOutcome { role, subscription, server_message: None })
            }
            // The server knowing about a cancellation we did not is a
            // refresh trigger, not a failure.
            Err(SubscriptionError::CancellationAlreadyScheduled { message }) => {
                let SyncOutcome { role, subscription } = self.sync.sync().await?;
                Ok(CancelOutcome { role, subscription, server_message: Some(message) })
            }
            Err(err) => Err(err),
        }
    }

    /// Resume a subscription scheduled to cancel at period end.
    pub async fn reactivate(&self) -> GatewayResult<ActionOutcome> {
        let _guard = self.begin("reactivate")?;

        let record = self.snapshot_or_err()?;
        match classify(Some(&record)) {
            LifecycleState::CanceledEndOfPeriod => {}
            state => return Err(SubscriptionError::ReactivateNotAllowed { state }),
        }
        if let Some(end) = record.end_date {
            if end <= unix_now() {
                return Err(SubscriptionError::ReactivationWindowPassed);
            }
        }

        self.sync.billing().reactivate().await?;
        let SyncOutcome { role, subscription } = self.sync.sync().await?;
        tracing::info!(target: "subscription.action", "Subscription reactivated");
        Ok(ActionOutcome { role, subscription })
    }

    /// Switch between the monthly and annual plans.
    pub async fn change_plan(&self, new_plan: Plan) -> GatewayResult<ActionOutcome> {
        let _guard = self.begin("change_plan")?;

        let record = self.snapshot_or_err()?;
        match classify(Some(&record)) {
            LifecycleState::FullyActive => {}
            state => return Err(SubscriptionError::PlanChangeNotAllowed { state }),
        }
        // Both ends of the transition must be in the monthly/annual pair.
        if !record.plan.is_switchable() {
            return Err(SubscriptionError::PlanNotSwitchable { plan: record.plan });
        }
        if !new_plan.is_switchable() {
            return Err(SubscriptionError::PlanNotSwitchable { plan: new_plan });
        }
        if new_plan == record.plan {
            return Err(SubscriptionError::SamePlan { plan: new_plan });
        }

        self.sync.billing().change_plan(new_plan).await?;
        let SyncOutcome { role, subscription } = self.sync.sync().await?;
        tracing::info!(
            target: "subscription.action",
            plan = %new_plan,
            "Plan changed"
        );
        Ok(ActionOutcome { role, subscription })
    }

    /// Request a full refund with immediate cancellation.
    ///
    /// Irreversible and immediately revokes entitlement; callers must
    /// obtain explicit user confirmation before invoking this. Gated on
    /// the collaborator's eligibility verdict, failing closed when it
    /// cannot be obtained.
    pub async fn request_refund(&self, reason: Option<&str>) -> GatewayResult<RefundOutcome> {
        let _guard = self.begin("request_refund")?;

        let record = self.snapshot_or_err()?;
        match classify(Some(&record)) {
            LifecycleState::FullyActive | LifecycleState::CanceledEndOfPeriod => {}
            state => return Err(SubscriptionError::RefundNotAllowed { state }),
        }

        let verdict = match self.sync.billing().check_refund_eligibility().await {
            Ok(verdict) => verdict,
            Err(_) => RefundEligibility::verification_failed(),
        };
        if !verdict.eligible {
            return Err(SubscriptionError::RefundNotEligible {
                reason: verdict
                    .reason
                    .unwrap_or_else(|| "refund window has closed".to_string()),
            });
        }

        let receipt = self.sync.billing().request_refund(reason).await?;
        let SyncOutcome { role, subscription } = self.sync.sync().await?;
        tracing::info!(
            target: "subscription.action",
            amount_cents = receipt.amount_cents,
            "Refund requested"
        );
        Ok(RefundOutcome { receipt, role, subscription })
    }

    /// Check auth and take the mutation lock.
    fn begin(&self, action: &'static str) -> GatewayResult<MutationGuard<'_>> {
        if !self.tokens.is_authenticated() {
            return Err(SubscriptionError::NotAuthenticated);
        }

        if self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(
                target: "subscription.lock_contended",
                action,
                "Rejected action while another is in flight"
            );
            return Err(SubscriptionError::ActionInProgress);
        }

        Ok(MutationGuard { lock: &self.lock })
    }

    fn snapshot_or_err(&self) -> GatewayResult<SubscriptionRecord> {
        self.store().snapshot().ok_or(SubscriptionError::NoSubscription)
    }
}

impl<B, A> std::fmt::Debug for ActionGateway<B, A>
where
    B: BillingClient,
    A: AuthClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionGateway")
            .field("state", &self.state())
            .field("locked", &self.lock.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
