//! Billing collaborator contract.
//!
//! The billing gateway owns all money movement; this crate only consumes
//! the subscription surface of it. Implementations map their transport
//! errors into [`SubscriptionError`] so the action gateway can tell a
//! rejection from an outage without parsing strings.

use serde::{Deserialize, Serialize};

use crate::subscription::error::SubscriptionError;
use crate::subscription::record::{Plan, SubscriptionRecord};
use crate::subscription::refund::RefundEligibility;

/// Result alias for billing collaborator calls.
pub type BillingResult<T> = std::result::Result<T, SubscriptionError>;

/// Receipt returned when a refund request is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Amount refunded, in cents.
    #[serde(rename = "amount")]
    pub amount_cents: i64,
    /// Currency code (e.g. "eur").
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Human-readable processing-time description.
    #[serde(rename = "processingTime")]
    pub processing_time: String,
}

fn default_currency() -> String {
    "eur".to_string()
}

/// Trait for billing collaborator operations.
pub trait BillingClient: Send + Sync {
    /// Fetch the caller's current subscription.
    ///
    /// Returns `Ok(None)` when the billing service reports no
    /// subscription (HTTP 404 on the wire).
    async fn get_current_subscription(&self) -> BillingResult<Option<SubscriptionRecord>>;

    /// Cancel the current subscription.
    ///
    /// `immediate` revokes access now; otherwise access is kept until
    /// the end of the paid period.
    async fn cancel(&self, immediate: bool) -> BillingResult<SubscriptionRecord>;

    /// Undo an end-of-period cancellation, resuming billing.
    async fn reactivate(&self) -> BillingResult<SubscriptionRecord>;

    /// Switch between the monthly and annual plans.
    async fn change_plan(&self, plan: Plan) -> BillingResult<SubscriptionRecord>;

    /// Request a full refund with immediate cancellation.
    async fn request_refund(&self, reason: Option<&str>) -> BillingResult<RefundReceipt>;

    /// Ask billing for the authoritative refund-eligibility verdict.
    async fn check_refund_eligibility(&self) -> BillingResult<RefundEligibility>;
}

/// Mock billing client for testing.
#[cfg(any(test, feature = "test-client"))]
pub mod test {
    use super::*;
    use crate::subscription::record::{CancelationType, SubscriptionStatus};
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    #[derive(Default)]
    struct Inner {
        record: RwLock<Option<SubscriptionRecord>>,
        eligibility: RwLock<Option<RefundEligibility>>,
        fail_transport: AtomicBool,
        cancel_already_scheduled: AtomicBool,
        latency_ms: AtomicU64,
        fetch_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
        reactivate_calls: AtomicUsize,
        change_plan_calls: AtomicUsize,
        refund_calls: AtomicUsize,
        eligibility_calls: AtomicUsize,
    }

    /// Mock billing client holding a scripted subscription record.
    ///
    /// Mutations edit the scripted record the way the real billing
    /// service would, so a post-mutation refetch observes the change.
    #[derive(Clone, Default)]
    pub struct MockBillingClient {
        inner: Arc<Inner>,
    }

    impl MockBillingClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the record returned by `get_current_subscription`.
        #[must_use]
        pub fn with_record(self, record: SubscriptionRecord) -> Self {
            *self.inner.record.write().unwrap() = Some(record);
            self
        }

        /// Script the eligibility verdict.
        #[must_use]
        pub fn with_eligibility(self, eligibility: RefundEligibility) -> Self {
            *self.inner.eligibility.write().unwrap() = Some(eligibility);
            self
        }

        /// Make every call fail as a transport error.
        #[must_use]
        pub fn fail_transport(self) -> Self {
            self.inner.fail_transport.store(true, Ordering::SeqCst);
            self
        }

        /// Make `cancel` return the billing service's
        /// already-scheduled rejection.
        #[must_use]
        pub fn reject_cancel_as_already_scheduled(self) -> Self {
            self.inner.cancel_already_scheduled.store(true, Ordering::SeqCst);
            self
        }

        /// Delay every mutating call, so tests can observe overlapping
        /// actions hitting the mutation lock.
        #[must_use]
        pub fn with_latency_ms(self, ms: u64) -> Self {
            self.inner.latency_ms.store(ms, Ordering::SeqCst);
            self
        }

        /// Total calls that reached the network layer.
        #[must_use]
        pub fn total_calls(&self) -> usize {
            self.fetch_calls()
                + self.cancel_calls()
                + self.reactivate_calls()
                + self.change_plan_calls()
                + self.refund_calls()
                + self.eligibility_calls()
        }

        #[must_use]
        pub fn fetch_calls(&self) -> usize {
            self.inner.fetch_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn cancel_calls(&self) -> usize {
            self.inner.cancel_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn reactivate_calls(&self) -> usize {
            self.inner.reactivate_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn change_plan_calls(&self) -> usize {
            self.inner.change_plan_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn refund_calls(&self) -> usize {
            self.inner.refund_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn eligibility_calls(&self) -> usize {
            self.inner.eligibility_calls.load(Ordering::SeqCst)
        }

        async fn pause(&self) {
            let ms = self.inner.latency_ms.load(Ordering::SeqCst);
            if ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            }
        }

        fn check_transport(&self, operation: &str) -> BillingResult<()> {
            if self.inner.fail_transport.load(Ordering::SeqCst) {
                return Err(SubscriptionError::Transport {
                    operation: operation.to_string(),
                    message: "billing service unreachable".to_string(),
                });
            }
            Ok(())
        }

        fn current(&self, operation: &str) -> BillingResult<SubscriptionRecord> {
            self.inner
                .record
                .read()
                .unwrap()
                .clone()
                .ok_or_else(|| SubscriptionError::Collaborator {
                    operation: operation.to_string(),
                    message: "no subscription".to_string(),
                    http_status: Some(404),
                })
        }
    }

    impl BillingClient for MockBillingClient {
        async fn get_current_subscription(&self) -> BillingResult<Option<SubscriptionRecord>> {
            self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.check_transport("get_current_subscription")?;
            Ok(self.inner.record.read().unwrap().clone())
        }

        async fn cancel(&self, immediate: bool) -> BillingResult<SubscriptionRecord> {
            self.inner.cancel_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            self.check_transport("cancel")?;

            if self.inner.cancel_already_scheduled.load(Ordering::SeqCst) {
                return Err(SubscriptionError::CancellationAlreadyScheduled {
                    message: "A cancellation is already scheduled for this subscription"
                        .to_string(),
                });
            }

            let mut record = self.current("cancel")?;
            record.status = SubscriptionStatus::Canceled;
            if immediate {
                record.cancelation_type = Some(CancelationType::Immediate);
                record.is_active = false;
            } else {
                record.cancelation_type = Some(CancelationType::EndOfPeriod);
            }
            *self.inner.record.write().unwrap() = Some(record.clone());
            Ok(record)
        }

        async fn reactivate(&self) -> BillingResult<SubscriptionRecord> {
            self.inner.reactivate_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            self.check_transport("reactivate")?;

            let mut record = self.current("reactivate")?;
            record.status = SubscriptionStatus::Active;
            record.cancelation_type = None;
            record.is_active = true;
            *self.inner.record.write().unwrap() = Some(record.clone());
            Ok(record)
        }

        async fn change_plan(&self, plan: Plan) -> BillingResult<SubscriptionRecord> {
            self.inner.change_plan_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            self.check_transport("change_plan")?;

            let mut record = self.current("change_plan")?;
            record.plan = plan;
            *self.inner.record.write().unwrap() = Some(record.clone());
            Ok(record)
        }

        async fn request_refund(&self, _reason: Option<&str>) -> BillingResult<RefundReceipt> {
            self.inner.refund_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            self.check_transport("request_refund")?;

            let mut record = self.current("request_refund")?;
            record.cancelation_type = Some(CancelationType::Immediate);
            record.refund_status = Some("processed".to_string());
            record.is_active = false;
            record.status = SubscriptionStatus::Canceled;
            *self.inner.record.write().unwrap() = Some(record);

            Ok(RefundReceipt {
                amount_cents: 999,
                currency: "eur".to_string(),
                processing_time: "3-5 business days".to_string(),
            })
        }

        async fn check_refund_eligibility(&self) -> BillingResult<RefundEligibility> {
            self.inner.eligibility_calls.fetch_add(1, Ordering::SeqCst);
            self.check_transport("check_refund_eligibility")?;

            self.inner
                .eligibility
                .read()
                .unwrap()
                .clone()
                .ok_or_else(|| SubscriptionError::Collaborator {
                    operation: "check_refund_eligibility".to_string(),
                    message: "no eligibility scripted".to_string(),
                    http_status: Some(404),
                })
        }
    }
}
