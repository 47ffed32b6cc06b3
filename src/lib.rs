//! Wayfarer - premium membership core for a travel-planning client
//!
//! Wayfarer implements the subscription lifecycle and entitlement state
//! machine behind the premium-access management screen: classifying the
//! billing record into a canonical lifecycle state, gating every mutating
//! action behind that state, and keeping the cached authorization role in
//! lockstep with billing truth after each mutation.
//!
//! # Features
//!
//! - **Classification**: total, pure mapping of a subscription record to
//!   one of six lifecycle states
//! - **Action gating**: cancel / reactivate / change-plan / refund, each
//!   validated locally before any network call
//! - **Entitlement sync**: forced token refresh and record refetch after
//!   every mutation, so displayed permissions never lag billing
//! - **Collaborators**: billing and auth reached over REST, with mock
//!   clients for tests behind the `test-client` feature
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wayfarer::{ActionGateway, AuthorizationContext, Config, RecordStore, TokenStore};
//! use wayfarer::billing::HttpBillingClient;
//! use wayfarer::auth::HttpAuthClient;
//!
//! wayfarer::init_tracing();
//!
//! let config = Config::builder().from_env().build()?;
//! let tokens = TokenStore::new();
//! let billing = HttpBillingClient::new(&config, tokens.clone())?;
//! let auth = AuthorizationContext::new(HttpAuthClient::new(&config, tokens.clone())?);
//!
//! let gateway = ActionGateway::new(billing, auth, tokens, RecordStore::new(), &config);
//! let outcome = gateway.cancel(false).await?;
//! ```

#![allow(async_fn_in_trait)] // collaborator seams are generic, never boxed

pub mod auth;
pub mod billing;
mod config;
mod error;
pub mod subscription;

// Re-exports for public API
pub use auth::{AuthClient, AuthorizationContext, Profile, Role};
pub use auth::token::{AccessToken, TokenStore};
pub use billing::{BillingClient, RefundReceipt};
pub use config::{Config, ConfigBuilder};
pub use error::{Result, WayfarerError};
pub use subscription::gateway::{ActionGateway, ActionOutcome, CancelOutcome, RefundOutcome};
pub use subscription::lifecycle::{classify, LifecycleState};
pub use subscription::presentation::{select_view, status_line, ActionKind, PanelView, ViewKind};
pub use subscription::record::{CancelationType, Plan, SubscriptionRecord, SubscriptionStatus};
pub use subscription::refund::{check_eligibility, RefundEligibility};
pub use subscription::store::RecordStore;
pub use subscription::sync::{EntitlementSynchronizer, SyncOutcome};
pub use subscription::SubscriptionError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// Respects `RUST_LOG`, falling back to `info` for this crate and `warn`
/// for everything else.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,wayfarer=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
