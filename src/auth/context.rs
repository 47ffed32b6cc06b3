//! The authorization role cache, as an explicit object.
//!
//! The role shown in the UI is a client-held copy of the role claim and
//! is only ever a hint. The context makes the cache lifecycle explicit:
//! `invalidate` clears it, `refresh` re-derives it from a freshly issued
//! token, and `role` repopulates it lazily from a plain profile read.
//! Entitlement-affecting mutations must go through [`refresh`] so the
//! clear-then-refresh-then-read ordering is enforced by the API shape
//! rather than by convention.
//!
//! [`refresh`]: AuthorizationContext::refresh

use std::sync::RwLock;

use crate::auth::client::AuthClient;
use crate::error::{Result, WayfarerError};

/// Role claim embedded in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Premium,
    Admin,
}

impl Role {
    /// Parse a role string, case-insensitively.
    ///
    /// Unknown roles fall back to `User`, never to a privileged role.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "premium" => Self::Premium,
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Premium => "premium",
            Self::Admin => "admin",
        }
    }

    /// Whether this role grants premium-tier access.
    #[must_use]
    pub fn can_access_premium(&self) -> bool {
        matches!(self, Self::Premium | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-held role cache with an explicit invalidate/refresh lifecycle.
pub struct AuthorizationContext<A: AuthClient> {
    client: A,
    cached: RwLock<Option<Role>>,
}

impl<A: AuthClient> AuthorizationContext<A> {
    #[must_use]
    pub fn new(client: A) -> Self {
        Self {
            client,
            cached: RwLock::new(None),
        }
    }

    /// Create a context pre-seeded with a role hint (e.g. decoded from
    /// the access token at login).
    #[must_use]
    pub fn with_hint(client: A, hint: Role) -> Self {
        let ctx = Self::new(client);
        *ctx.cached.write().expect("role cache lock poisoned") = Some(hint);
        ctx
    }

    /// The cached role, if any. A hint only, never a precondition for
    /// a mutating action.
    #[must_use]
    pub fn cached_role(&self) -> Option<Role> {
        *self.cached.read().expect("role cache lock poisoned")
    }

    /// Clear the cached role, forcing the next read to re-derive it.
    pub fn invalidate(&self) {
        *self.cached.write().expect("role cache lock poisoned") = None;
        tracing::debug!(target: "auth.role.invalidated", "Role cache cleared");
    }

    /// The current role, repopulating the cache lazily from a profile
    /// read when empty. Does not force a token refresh.
    pub async fn role(&self) -> Result<Role> {
        if let Some(role) = self.cached_role() {
            return Ok(role);
        }
        let profile = self.client.get_profile().await?;
        *self.cached.write().expect("role cache lock poisoned") = Some(profile.role);
        Ok(profile.role)
    }

    /// Invalidate, force a token refresh, then re-read the role from the
    /// profile on the new token.
    ///
    /// This is the only path that may treat the returned role as
    /// authoritative. A rejected refresh leaves the cache empty and
    /// fails; stale entitlement is never silently kept.
    pub async fn refresh(&self) -> Result<Role> {
        self.invalidate();

        match self.client.refresh_token().await? {
            Some(_) => {}
            None => {
                tracing::warn!(
                    target: "auth.token.refresh_failed",
                    "Token refresh rejected; role cache left empty"
                );
                return Err(WayfarerError::unauthorized("token refresh rejected"));
            }
        }

        let profile = self.client.get_profile().await?;
        *self.cached.write().expect("role cache lock poisoned") = Some(profile.role);
        Ok(profile.role)
    }

    /// Access the underlying auth client.
    #[must_use]
    pub fn client(&self) -> &A {
        &self.client
    }
}

impl<A: AuthClient> std::fmt::Debug for AuthorizationContext<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("cached", &self.cached_role())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test::MockAuthClient;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Premium"), Role::Premium);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("anything-else"), Role::User);
    }

    #[test]
    fn test_premium_access() {
        assert!(Role::Premium.can_access_premium());
        assert!(Role::Admin.can_access_premium());
        assert!(!Role::User.can_access_premium());
    }

    #[tokio::test]
    async fn test_lazy_repopulation() {
        let client = MockAuthClient::new().with_role(Role::Premium);
        let ctx = AuthorizationContext::new(client);

        assert_eq!(ctx.cached_role(), None);
        assert_eq!(ctx.role().await.unwrap(), Role::Premium);
        assert_eq!(ctx.cached_role(), Some(Role::Premium));
        // Second read is served from the cache.
        ctx.role().await.unwrap();
        assert_eq!(ctx.client().profile_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_orders_invalidate_before_read() {
        let client = MockAuthClient::new().with_role(Role::User);
        let ctx = AuthorizationContext::with_hint(client, Role::Premium);

        // The stale hint says premium; a forced refresh must replace it.
        let role = ctx.refresh().await.unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(ctx.cached_role(), Some(Role::User));
        assert_eq!(ctx.client().refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_leaves_cache_empty() {
        let client = MockAuthClient::new().with_role(Role::Premium).reject_refresh();
        let ctx = AuthorizationContext::with_hint(client, Role::Premium);

        let err = ctx.refresh().await.unwrap_err();
        assert!(matches!(err, WayfarerError::Unauthorized(_)));
        assert_eq!(ctx.cached_role(), None);
    }
}
