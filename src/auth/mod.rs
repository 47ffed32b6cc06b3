//! Auth collaborator contract and the authorization role cache.
//!
//! The cached role is a UI hint, never a source of truth: it is cleared
//! on every entitlement-affecting mutation and re-derived from a freshly
//! issued token. See [`AuthorizationContext`] for the enforced lifecycle.

pub mod client;
pub mod context;
pub mod token;

pub use client::{AuthClient, HttpAuthClient, Profile};
pub use context::{AuthorizationContext, Role};
pub use token::{role_hint_from_token, AccessToken, TokenStore};

// Test exports
#[cfg(any(test, feature = "test-client"))]
pub mod test {
    pub use super::client::test::MockAuthClient;
}
