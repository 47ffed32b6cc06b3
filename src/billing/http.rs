//! Billing collaborator reached over REST.
//!
//! Wire notes: the gateway 404s on `GET /subscription/current` when no
//! subscription exists, wraps mutated records in a `subscription` field,
//! and flags a duplicate cancellation with a dedicated error code so the
//! client can surface the server's own message instead of a generic
//! failure.

use serde::Deserialize;

use crate::auth::token::TokenStore;
use crate::config::Config;
use crate::error::WayfarerError;
use crate::subscription::error::SubscriptionError;
use crate::subscription::record::{Plan, SubscriptionRecord};
use crate::subscription::refund::RefundEligibility;

use super::client::{BillingClient, BillingResult, RefundReceipt};

/// Error-code the billing gateway uses for a duplicate cancellation.
const CODE_CANCELLATION_SCHEDULED: &str = "cancellation_already_scheduled";

#[derive(Debug, Deserialize)]
struct MutationWire {
    subscription: SubscriptionRecord,
}

#[derive(Debug, Deserialize)]
struct RefundWire {
    refund: RefundReceipt,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorWire {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Billing collaborator client over HTTP.
#[derive(Clone)]
pub struct HttpBillingClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpBillingClient {
    pub fn new(config: &Config, tokens: TokenStore) -> crate::error::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| WayfarerError::internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!("{}/subscription", config.billing_base_url.trim_end_matches('/')),
            tokens,
        })
    }

    fn bearer(&self) -> BillingResult<String> {
        self.tokens.bearer().ok_or(SubscriptionError::NotAuthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a request with auth and, for mutations, a request id.
    async fn send(
        &self,
        operation: &str,
        builder: reqwest::RequestBuilder,
        mutating: bool,
    ) -> BillingResult<reqwest::Response> {
        let mut builder = builder.header(reqwest::header::AUTHORIZATION, self.bearer()?);
        if mutating {
            builder = builder.header("X-Request-Id", uuid::Uuid::new_v4().to_string());
        }

        builder.send().await.map_err(|e| transport(operation, e))
    }

    /// Map a non-success response to the domain error families.
    async fn reject(&self, operation: &str, response: reqwest::Response) -> SubscriptionError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let wire: ErrorWire = serde_json::from_str(&body).unwrap_or_default();
        let message = wire.message.unwrap_or(body);

        if wire.code.as_deref() == Some(CODE_CANCELLATION_SCHEDULED) {
            return SubscriptionError::CancellationAlreadyScheduled { message };
        }

        if (500..=599).contains(&status) {
            return SubscriptionError::Transport {
                operation: operation.to_string(),
                message: format!("billing service failed with status {}", status),
            };
        }

        SubscriptionError::Collaborator {
            operation: operation.to_string(),
            message,
            http_status: Some(status),
        }
    }
}

fn transport(operation: &str, err: reqwest::Error) -> SubscriptionError {
    SubscriptionError::Transport {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    operation: &str,
    response: reqwest::Response,
) -> BillingResult<T> {
    response.json().await.map_err(|e| SubscriptionError::Collaborator {
        operation: operation.to_string(),
        message: format!("malformed response: {}", e),
        http_status: None,
    })
}

impl BillingClient for HttpBillingClient {
    async fn get_current_subscription(&self) -> BillingResult<Option<SubscriptionRecord>> {
        let operation = "get_current_subscription";
        let response = self
            .send(operation, self.http.get(self.url("/current")), false)
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        Ok(Some(decode(operation, response).await?))
    }

    async fn cancel(&self, immediate: bool) -> BillingResult<SubscriptionRecord> {
        let operation = "cancel";
        let response = self
            .send(
                operation,
                self.http
                    .delete(self.url("/cancel"))
                    .json(&serde_json::json!({ "immediate": immediate })),
                true,
            )
            .await?;

        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        let wire: MutationWire = decode(operation, response).await?;
        Ok(wire.subscription)
    }

    async fn reactivate(&self) -> BillingResult<SubscriptionRecord> {
        let operation = "reactivate";
        let response = self
            .send(operation, self.http.post(self.url("/reactivate")), true)
            .await?;

        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        let wire: MutationWire = decode(operation, response).await?;
        Ok(wire.subscription)
    }

    async fn change_plan(&self, plan: Plan) -> BillingResult<SubscriptionRecord> {
        let operation = "change_plan";
        let response = self
            .send(
                operation,
                self.http
                    .put(self.url("/change-plan"))
                    .json(&serde_json::json!({ "newPlan": plan })),
                true,
            )
            .await?;

        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        let wire: MutationWire = decode(operation, response).await?;
        Ok(wire.subscription)
    }

    async fn request_refund(&self, reason: Option<&str>) -> BillingResult<RefundReceipt> {
        let operation = "request_refund";
        let response = self
            .send(
                operation,
                self.http
                    .post(self.url("/refund"))
                    .json(&serde_json::json!({ "reason": reason.unwrap_or("") })),
                true,
            )
            .await?;

        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        let wire: RefundWire = decode(operation, response).await?;
        Ok(wire.refund)
    }

    async fn check_refund_eligibility(&self) -> BillingResult<RefundEligibility> {
        let operation = "check_refund_eligibility";
        let response = self
            .send(operation, self.http.get(self.url("/refund/eligibility")), false)
            .await?;

        if !response.status().is_success() {
            return Err(self.reject(operation, response).await);
        }

        decode(operation, response).await
    }
}

impl std::fmt::Debug for HttpBillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBillingClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::AccessToken;

    fn client() -> HttpBillingClient {
        let config = Config::builder()
            .with_billing_base_url("https://billing.test/")
            .build()
            .unwrap();
        HttpBillingClient::new(&config, TokenStore::new()).unwrap()
    }

    #[test]
    fn test_url_joining_strips_trailing_slash() {
        let client = client();
        assert_eq!(
            client.url("/current"),
            "https://billing.test/subscription/current"
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_short_circuits_without_network() {
        // The base URL resolves nowhere; an attempted request would fail
        // with a transport error, so NotAuthenticated proves we never
        // built one.
        let client = client();
        let err = client.cancel(false).await.unwrap_err();
        assert_eq!(err, SubscriptionError::NotAuthenticated);
    }

    #[test]
    fn test_bearer_present_when_token_set() {
        let config = Config::builder().build().unwrap();
        let tokens = TokenStore::with_token(AccessToken::new("tok"));
        let client = HttpBillingClient::new(&config, tokens).unwrap();
        assert_eq!(client.bearer().unwrap(), "Bearer tok");
    }
}
