//! Auth collaborator seam.
//!
//! The core needs exactly two things from the auth service: a profile
//! read (which carries the authoritative role) and a forced token
//! refresh. The role from a profile read is only authoritative
//! immediately after a refresh; [`AuthorizationContext::refresh`]
//! enforces that ordering.
//!
//! [`AuthorizationContext::refresh`]: crate::auth::AuthorizationContext::refresh

use serde::Deserialize;

use crate::auth::context::Role;
use crate::auth::token::{AccessToken, TokenStore};
use crate::config::Config;
use crate::error::{Result, WayfarerError};

/// A user profile as returned by the auth collaborator.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The role claim on the current token.
    pub role: Role,
    /// Account email, when the service exposes it.
    pub email: Option<String>,
}

/// Trait for auth collaborator operations.
pub trait AuthClient: Send + Sync {
    /// Fetch the current user's profile.
    async fn get_profile(&self) -> Result<Profile>;

    /// Ask the auth service for a freshly issued access token.
    ///
    /// Returns `Ok(None)` when the refresh is rejected (expired or
    /// revoked session). Callers must not fall back to the old token
    /// for entitlement decisions.
    async fn refresh_token(&self) -> Result<Option<AccessToken>>;
}

#[derive(Debug, Deserialize)]
struct ProfileWire {
    role: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshWire {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Auth collaborator reached over REST.
#[derive(Clone)]
pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpAuthClient {
    pub fn new(config: &Config, tokens: TokenStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| WayfarerError::internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn bearer(&self) -> Result<String> {
        self.tokens
            .bearer()
            .ok_or_else(|| WayfarerError::unauthorized("not authenticated"))
    }
}

impl AuthClient for HttpAuthClient {
    async fn get_profile(&self) -> Result<Profile> {
        let bearer = self.bearer()?;
        let url = format!("{}/api/auth/profile", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WayfarerError::unauthorized(format!(
                "profile fetch failed ({}): {}",
                status, body
            )));
        }

        let wire: ProfileWire = response.json().await?;
        Ok(Profile {
            role: wire.role.as_deref().map(Role::parse).unwrap_or(Role::User),
            email: wire.email,
        })
    }

    async fn refresh_token(&self) -> Result<Option<AccessToken>> {
        let bearer = self.bearer()?;
        let url = format!("{}/api/auth/refresh", self.base_url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .send()
            .await?;

        // A rejected refresh is an answer, not a transport failure.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            self.tokens.clear();
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(WayfarerError::internal(format!(
                "token refresh failed with status {}",
                status
            )));
        }

        let wire: RefreshWire = response.json().await?;
        match wire.access_token {
            Some(raw) => {
                let token = AccessToken::new(raw);
                self.tokens.set(token.clone());
                tracing::debug!(target: "auth.token.refreshed", "Access token rotated");
                Ok(Some(token))
            }
            None => {
                self.tokens.clear();
                Ok(None)
            }
        }
    }
}

/// Mock auth client for testing.
#[cfg(any(test, feature = "test-client"))]
pub mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    #[derive(Default)]
    struct Inner {
        role: RwLock<Option<Role>>,
        email: RwLock<Option<String>>,
        reject_refresh: AtomicBool,
        fail_transport: AtomicBool,
        profile_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
    }

    /// Mock auth client with scripted responses and call counters.
    #[derive(Clone, Default)]
    pub struct MockAuthClient {
        inner: Arc<Inner>,
    }

    impl MockAuthClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the role returned by profile reads.
        #[must_use]
        pub fn with_role(self, role: Role) -> Self {
            *self.inner.role.write().unwrap() = Some(role);
            self
        }

        /// Make refresh_token return `Ok(None)`.
        #[must_use]
        pub fn reject_refresh(self) -> Self {
            self.inner.reject_refresh.store(true, Ordering::SeqCst);
            self
        }

        /// Make every call fail as a transport error.
        #[must_use]
        pub fn fail_transport(self) -> Self {
            self.inner.fail_transport.store(true, Ordering::SeqCst);
            self
        }

        /// Change the role mid-test (e.g. demotion after a refund).
        pub fn set_role(&self, role: Role) {
            *self.inner.role.write().unwrap() = Some(role);
        }

        #[must_use]
        pub fn profile_calls(&self) -> usize {
            self.inner.profile_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn refresh_calls(&self) -> usize {
            self.inner.refresh_calls.load(Ordering::SeqCst)
        }
    }

    impl AuthClient for MockAuthClient {
        async fn get_profile(&self) -> Result<Profile> {
            self.inner.profile_calls.fetch_add(1, Ordering::SeqCst);
            if self.inner.fail_transport.load(Ordering::SeqCst) {
                return Err(WayfarerError::service_unavailable("auth service unreachable"));
            }
            Ok(Profile {
                role: self.inner.role.read().unwrap().unwrap_or(Role::User),
                email: self.inner.email.read().unwrap().clone(),
            })
        }

        async fn refresh_token(&self) -> Result<Option<AccessToken>> {
            self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.inner.fail_transport.load(Ordering::SeqCst) {
                return Err(WayfarerError::service_unavailable("auth service unreachable"));
            }
            if self.inner.reject_refresh.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(Some(AccessToken::new("mock-refreshed-token")))
        }
    }
}
