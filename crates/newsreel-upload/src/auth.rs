//! OAuth2 credential handling.
//!
//! Each account carries a long-lived refresh token on disk. Before an
//! upload the token manager exchanges it for a short-lived access
//! token (reusing a still-valid stored one when possible) and persists
//! the refreshed state back in place, so a restart never loses a
//! refresh. A credential that cannot be read or refreshed makes the
//! account unusable for this job; that is an account-skip, not a
//! job-fatal error.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::accounts::AccountEntry;
use crate::error::{UploadError, UploadResult};

const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Validity margin: tokens expiring within this window are refreshed
/// rather than risking mid-upload expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// A usable short-lived access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    secret: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Bearer header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret)
    }

    /// Raw token value, without the header scheme.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    fn is_fresh(&self) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_SKEW_SECS) > Utc::now()
    }
}

/// `client_secret_{i}.json` layout (Google "installed app" flavor).
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: ClientSecret,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
}

/// `token_{i}.json` layout. Rewritten in place on refresh.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// Exchanges refresh tokens for access tokens.
#[derive(Debug, Clone)]
pub struct TokenManager {
    http: reqwest::Client,
    token_endpoint: String,
}

impl TokenManager {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Point at a different token endpoint (tests).
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Obtain a usable access token for `account`, refreshing and
    /// persisting if the stored one is stale.
    pub async fn authorize(&self, account: &AccountEntry) -> UploadResult<AccessToken> {
        let secret = self.read_client_secret(account).await?;
        let stored = self.read_stored_token(account).await?;

        if let (Some(access), Some(expiry)) = (&stored.access_token, stored.expiry) {
            let token = AccessToken::new(access.clone(), expiry);
            if token.is_fresh() {
                debug!(account = %account.name, "Reusing stored access token");
                return Ok(token);
            }
        }

        let refreshed = self.refresh(account, &secret, &stored.refresh_token).await?;

        // Persist in place so the next job skips the refresh.
        let updated = StoredToken {
            refresh_token: stored.refresh_token,
            access_token: Some(refreshed.secret.clone()),
            expiry: Some(refreshed.expires_at),
        };
        fs::write(&account.token_path, serde_json::to_vec_pretty(&updated)?)
            .await
            .map_err(|e| {
                UploadError::auth_unavailable(
                    &account.name,
                    format!("failed to persist refreshed token: {}", e),
                )
            })?;

        info!(account = %account.name, "Refreshed access token");
        Ok(refreshed)
    }

    async fn read_client_secret(&self, account: &AccountEntry) -> UploadResult<ClientSecret> {
        let raw = fs::read_to_string(&account.client_secret_path)
            .await
            .map_err(|e| {
                UploadError::auth_unavailable(&account.name, format!("client secret: {}", e))
            })?;
        let file: ClientSecretFile = serde_json::from_str(&raw).map_err(|e| {
            UploadError::auth_unavailable(&account.name, format!("client secret parse: {}", e))
        })?;
        Ok(file.installed)
    }

    async fn read_stored_token(&self, account: &AccountEntry) -> UploadResult<StoredToken> {
        let raw = fs::read_to_string(&account.token_path).await.map_err(|e| {
            UploadError::auth_unavailable(&account.name, format!("token file: {}", e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            UploadError::auth_unavailable(&account.name, format!("token parse: {}", e))
        })
    }

    async fn refresh(
        &self,
        account: &AccountEntry,
        secret: &ClientSecret,
        refresh_token: &str,
    ) -> UploadResult<AccessToken> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", &secret.client_id),
                ("client_secret", &secret.client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| {
                UploadError::auth_unavailable(&account.name, format!("token endpoint: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::auth_unavailable(
                &account.name,
                format!("refresh rejected with {}: {}", status, body),
            ));
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| {
            UploadError::auth_unavailable(&account.name, format!("refresh parse: {}", e))
        })?;

        Ok(AccessToken::new(
            refreshed.access_token,
            Utc::now() + ChronoDuration::seconds(refreshed.expires_in),
        ))
    }
}
