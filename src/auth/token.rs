//! Access token storage and the client-side role hint.
//!
//! The token holder is shared between both collaborator clients so a
//! refresh performed by the auth client is immediately visible to the
//! billing client. The token itself is kept behind [`SecretString`] and
//! never appears in logs or debug output.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::{Arc, RwLock};

use crate::auth::context::Role;

/// A bearer access token issued by the auth collaborator.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::new(raw.into()))
    }

    /// Expose the raw token for constructing an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// Shared holder for the current access token.
///
/// Cheap to clone; all clones observe the same token. An empty store
/// means the user is not authenticated, which every mutating action
/// treats as a local precondition failure rather than a server error.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<AccessToken>>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token.
    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Replace the current token (after login or a successful refresh).
    pub fn set(&self, token: AccessToken) {
        *self.inner.write().expect("token store lock poisoned") = Some(token);
    }

    /// Drop the current token (logout, or a rejected refresh).
    pub fn clear(&self) {
        *self.inner.write().expect("token store lock poisoned") = None;
    }

    /// The current token, if any.
    #[must_use]
    pub fn current(&self) -> Option<AccessToken> {
        self.inner.read().expect("token store lock poisoned").clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().expect("token store lock poisoned").is_some()
    }

    /// The `Authorization` header value for the current token.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.current().map(|t| format!("Bearer {}", t.expose()))
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RoleClaims {
    #[serde(default)]
    role: Option<String>,
}

/// Extract the role claim from an access token without verifying it.
///
/// This is strictly a UI hint: the payload is decoded unverified, the
/// same way the client cannot verify a signature it has no key for.
/// Authorization decisions stay server-side; the membership core only
/// uses the hint to avoid a round trip before the first profile fetch.
#[must_use]
pub fn role_hint_from_token(token: &AccessToken) -> Option<Role> {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = jsonwebtoken::DecodingKey::from_secret(&[]);
    let data = jsonwebtoken::decode::<RoleClaims>(token.expose(), &key, &validation).ok()?;
    Some(data.claims.role.as_deref().map(Role::parse).unwrap_or(Role::User))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: serde_json::Value) -> AccessToken {
        let key = jsonwebtoken::EncodingKey::from_secret(b"test-secret");
        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256);
        AccessToken::new(jsonwebtoken::encode(&header, &payload, &key).unwrap())
    }

    #[test]
    fn test_store_roundtrip() {
        let store = TokenStore::new();
        assert!(!store.is_authenticated());
        assert!(store.bearer().is_none());

        store.set(AccessToken::new("abc"));
        assert!(store.is_authenticated());
        assert_eq!(store.bearer().unwrap(), "Bearer abc");

        store.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let store = TokenStore::new();
        let clone = store.clone();
        store.set(AccessToken::new("abc"));
        assert!(clone.is_authenticated());
    }

    #[test]
    fn test_debug_never_exposes_token() {
        let store = TokenStore::with_token(AccessToken::new("super-secret-token"));
        let debug = format!("{:?} {:?}", store, store.current().unwrap());
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn test_role_hint_from_token() {
        let token = make_token(serde_json::json!({ "sub": "u1", "role": "premium" }));
        assert_eq!(role_hint_from_token(&token), Some(Role::Premium));
    }

    #[test]
    fn test_role_hint_defaults_to_user() {
        let token = make_token(serde_json::json!({ "sub": "u1" }));
        assert_eq!(role_hint_from_token(&token), Some(Role::User));

        let token = make_token(serde_json::json!({ "sub": "u1", "role": "galactic" }));
        assert_eq!(role_hint_from_token(&token), Some(Role::User));
    }

    #[test]
    fn test_role_hint_rejects_garbage() {
        assert_eq!(role_hint_from_token(&AccessToken::new("not-a-jwt")), None);
    }
}
