//! Subscription lifecycle and entitlement state machine.
//!
//! Reconciles the four independent billing signals (status, entitlement
//! flag, cancellation mode, refund marker) into one canonical lifecycle
//! state, and gates every mutating action behind that state plus the
//! time-windowed refund rules.
//!
//! # Example
//!
//! ```rust,ignore
//! use wayfarer::subscription::{classify, LifecycleState};
//! use wayfarer::{ActionGateway, AuthorizationContext, Config, RecordStore, TokenStore};
//!
//! let gateway = ActionGateway::new(billing, auth, tokens, RecordStore::new(), &config);
//!
//! gateway.load().await?;
//! match gateway.state() {
//!     LifecycleState::CanceledEndOfPeriod => {
//!         let outcome = gateway.reactivate().await?;
//!         println!("role is now {}", outcome.role);
//!     }
//!     other => println!("nothing to do in {}", other),
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod presentation;
pub mod record;
pub mod refund;
pub mod store;
pub mod sync;

// Record exports
pub use record::{CancelationType, Plan, SubscriptionRecord, SubscriptionStatus};

// Classifier exports
pub use lifecycle::{classify, LifecycleState};

// Refund exports
pub use refund::{check_eligibility, RefundEligibility};

// Gateway exports
pub use gateway::{ActionGateway, ActionOutcome, CancelOutcome, GatewayResult, RefundOutcome};

// Sync exports
pub use sync::{EntitlementSynchronizer, SyncOutcome};

// Store exports
pub use store::RecordStore;

// Presentation exports
pub use presentation::{select_view, status_line, ActionKind, PanelView, ViewKind};

// Error exports
pub use error::SubscriptionError;
