//! Identity provider collaborator.
//!
//! The migration creates one account per user and asks the provider to send
//! that user a password-reset email. The
//! [`FirebaseAuthClient`] talks to the Firebase Auth admin REST API
//! (identity toolkit v1).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::http::{create_http_client, handle_http_error, validate_url, Service};

/// Account creation request.
#[derive(Clone)]
pub struct NewAccount {
    /// Login email.
    pub email: String,
    /// Single-use credential, never persisted.
    pub password: String,
    /// Whether the email is marked verified.
    pub email_verified: bool,
}

impl NewAccount {
    /// Builds a request with a fresh random credential and an unverified email.
    #[must_use]
    pub fn with_temporary_password(email: &str) -> Self {
        Self {
            email: email.to_string(),
            password: uuid::Uuid::new_v4().to_string(),
            email_verified: false,
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("email_verified", &self.email_verified)
            .finish()
    }
}

/// An account created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider-assigned uid.
    pub uid: String,
}

/// Result of a password-reset request. The migration never reads it.
#[derive(Clone, Default)]
pub struct ResetArtifact {
    /// Out-of-band reset link. Firebase leaves this empty when it emails the
    /// link itself.
    pub link: Option<String>,
}

impl fmt::Debug for ResetArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetArtifact")
            .field("link", &self.link.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Trait for identity providers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Creates an account and returns its identity.
    async fn create_account(&self, account: &NewAccount) -> Result<Identity>;

    /// Starts the provider's password-reset notification for `email`.
    async fn issue_password_reset(&self, email: &str) -> Result<ResetArtifact>;
}

/// Body of `POST /v1/projects/{project}/accounts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

/// Body of `POST /v1/projects/{project}/accounts:sendOobCode`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeResponse {
    #[serde(default)]
    oob_link: Option<String>,
}

/// Firebase Authentication admin REST client.
pub struct FirebaseAuthClient {
    config: IdentityConfig,
    client: Client,
}

impl FirebaseAuthClient {
    /// Creates a new client with the shared HTTP client settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid.
    pub fn new(config: IdentityConfig) -> Result<Self> {
        validate_url(&config.url)?;
        Ok(Self {
            config,
            client: create_http_client(),
        })
    }

    /// Builds the API URL for an account action (`""` or `":sendOobCode"`).
    fn build_url(&self, action: &str) -> String {
        format!(
            "{}/v1/projects/{}/accounts{}",
            self.config.url.trim_end_matches('/'),
            self.config.project_id,
            action
        )
    }

    /// Makes a POST request to the identity toolkit.
    async fn api_request<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        body: &T,
    ) -> Result<R> {
        let url = self.build_url(action);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(handle_http_error(status.as_u16(), &body, Service::Identity));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Identity(format!("Failed to parse Firebase Auth response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    fn provider_name(&self) -> &'static str {
        "firebase_auth"
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Identity> {
        let request = SignUpRequest {
            email: &account.email,
            password: &account.password,
            email_verified: account.email_verified,
        };

        let response: SignUpResponse = self.api_request("", &request).await?;

        Ok(Identity {
            uid: response.local_id,
        })
    }

    async fn issue_password_reset(&self, email: &str) -> Result<ResetArtifact> {
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email,
        };

        let response: OobCodeResponse = self.api_request(":sendOobCode", &request).await?;

        Ok(ResetArtifact {
            link: response.oob_link,
        })
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
