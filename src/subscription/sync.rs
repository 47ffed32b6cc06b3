//! Post-mutation entitlement sync.
//!
//! After any mutation the cached role and the record snapshot are both
//! re-derived from ground truth, in a fixed order: invalidate the role
//! cache, obtain a freshly issued token, read the profile on it, then
//! refetch the subscription record. UI state is only updated from the
//! result, so displayed permissions never lag billing, not even for one
//! render.

use crate::auth::client::AuthClient;
use crate::auth::context::{AuthorizationContext, Role};
use crate::billing::client::BillingClient;
use crate::subscription::error::SubscriptionError;
use crate::subscription::record::SubscriptionRecord;
use crate::subscription::store::RecordStore;

/// Ground truth after a sync: the role on the fresh token and the
/// refetched subscription record.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub role: Role,
    pub subscription: Option<SubscriptionRecord>,
}

/// Re-syncs the role cache and record snapshot after mutations.
pub struct EntitlementSynchronizer<B, A>
where
    B: BillingClient,
    A: AuthClient,
{
    billing: B,
    auth: AuthorizationContext<A>,
    store: RecordStore,
}

impl<B, A> EntitlementSynchronizer<B, A>
where
    B: BillingClient,
    A: AuthClient,
{
    #[must_use]
    pub fn new(billing: B, auth: AuthorizationContext<A>, store: RecordStore) -> Self {
        Self { billing, auth, store }
    }

    #[must_use]
    pub fn billing(&self) -> &B {
        &self.billing
    }

    #[must_use]
    pub fn auth(&self) -> &AuthorizationContext<A> {
        &self.auth
    }

    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Refresh role and record from ground truth.
    ///
    /// A failed token refresh is fatal to the session's entitlement
    /// display: the role cache stays empty and the caller must surface a
    /// reconnect affordance rather than assume the mutation's outcome.
    /// A failed record refetch propagates as-is (retryable); the
    /// previous snapshot is left untouched.
    pub async fn sync(&self) -> Result<SyncOutcome, SubscriptionError> {
        let role = match self.auth.refresh().await {
            Ok(role) => role,
            Err(err) => {
                tracing::warn!(
                    target: "subscription.sync",
                    error = %err,
                    "Token refresh failed after mutation; reconnect required"
                );
                return Err(SubscriptionError::ReconnectRequired);
            }
        };

        let subscription = self.billing.get_current_subscription().await?;
        self.store.replace(subscription.clone());

        tracing::debug!(
            target: "subscription.sync",
            role = %role,
            has_subscription = subscription.is_some(),
            "Entitlement state re-synced"
        );

        Ok(SyncOutcome { role, subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test::MockAuthClient;
    use crate::billing::test::MockBillingClient;
    use crate::subscription::record::{Plan, SubscriptionStatus};

    fn record() -> SubscriptionRecord {
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

    #[tokio::test]
    async fn test_sync_replaces_snapshot_and_role() {
        let billing = MockBillingClient::new().with_record(record());
        let auth = AuthorizationContext::with_hint(
            MockAuthClient::new().with_role(Role::Premium),
            Role::User,
        );
        let sync = EntitlementSynchronizer::new(billing, auth, RecordStore::new());

        let outcome = sync.sync().await.unwrap();
        assert_eq!(outcome.role, Role::Premium);
        assert_eq!(outcome.subscription.unwrap().id, "sub_1");
        assert_eq!(sync.store().snapshot().unwrap().id, "sub_1");
        assert_eq!(sync.auth().cached_role(), Some(Role::Premium));
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_reconnect_required() {
        let billing = MockBillingClient::new().with_record(record());
        let auth = AuthorizationContext::new(
            MockAuthClient::new().with_role(Role::Premium).reject_refresh(),
        );
        let sync = EntitlementSynchronizer::new(billing, auth, RecordStore::new());

        let err = sync.sync().await.unwrap_err();
        assert_eq!(err, SubscriptionError::ReconnectRequired);
        assert!(err.is_fatal());
        // Stale role never survives a failed refresh.
        assert_eq!(sync.auth().cached_role(), None);
        // The record was not refetched on the failed path.
        assert_eq!(sync.billing().fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_snapshot() {
        let billing = MockBillingClient::new().fail_transport();
        let auth = AuthorizationContext::new(MockAuthClient::new().with_role(Role::Premium));
        let store = RecordStore::new();
        store.replace(Some(record()));
        let sync = EntitlementSynchronizer::new(billing, auth, store);

        let err = sync.sync().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(sync.store().snapshot().is_some());
    }

    #[tokio::test]
    async fn test_sync_with_no_subscription_clears_snapshot() {
        let billing = MockBillingClient::new();
        let auth = AuthorizationContext::new(MockAuthClient::new().with_role(Role::User));
        let store = RecordStore::new();
        store.replace(Some(record()));
        let sync = EntitlementSynchronizer::new(billing, auth, store);

        let outcome = sync.sync().await.unwrap();
        assert!(outcome.subscription.is_none());
        assert!(sync.store().snapshot().is_none());
    }
}
