//! Billing collaborator module.
//!
//! The billing backend that actually charges cards is out of scope; this
//! module is the contract the membership core needs from it, an HTTP
//! implementation of that contract, and a scriptable mock for tests.

pub mod client;
pub mod http;

pub use client::{BillingClient, BillingResult, RefundReceipt};
pub use http::HttpBillingClient;

// Test exports
#[cfg(any(test, feature = "test-client"))]
pub mod test {
    pub use super::client::test::MockBillingClient;
}
