use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::config::{GoogleConfig, GoogleCredentials};
use crate::error::{describe_transport, DigestError, DigestResult};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(20);

/// Source of short-lived bearer tokens for the Gmail API
pub trait AccessTokenSource: Send + Sync {
    fn access_token<'a>(&'a self)
        -> Pin<Box<dyn Future<Output = DigestResult<String>> + Send + 'a>>;
}

/// Exchanges the stored refresh token for a fresh access token.
///
/// Google OAuth2 access tokens expire after 1 hour. A digest run only lasts
/// a few seconds, so every call mints a new token and nothing is cached.
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
    credentials: GoogleCredentials,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
}

impl TokenExchanger {
    /// Create an exchanger, failing before any network call when a
    /// credential is missing
    pub fn new(http: reqwest::Client, config: &GoogleConfig) -> DigestResult<Self> {
        let credentials = config.credentials()?;

        Ok(TokenExchanger {
            http,
            token_url: config.token_url.clone(),
            credentials,
        })
    }

    /// Perform the refresh-token grant
    pub async fn exchange(&self) -> DigestResult<String> {
        info!("🔐 Exchanging refresh token for a Gmail access token");

        let response = self
            .http
            .post(&self.token_url)
            .timeout(TOKEN_TIMEOUT)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| DigestError::Auth(describe_transport(&e)))?;

        let status = response.status();

        if !status.is_success() {
            // Google answers {"error": "invalid_grant", ...} on revoked tokens
            let code = response
                .json::<TokenErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| "unknown_error".to_string());

            return Err(DigestError::Auth(format!(
                "token endpoint returned {} ({})",
                status.as_u16(),
                code
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| DigestError::Auth(describe_transport(&e)))?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DigestError::Auth("no access_token in token response".to_string()))?;

        debug!("Access token obtained ({} chars)", token.len());

        Ok(token)
    }
}

impl AccessTokenSource for TokenExchanger {
    fn access_token<'a>(&'a self)
        -> Pin<Box<dyn Future<Output = DigestResult<String>> + Send + 'a>> {
        Box::pin(self.exchange())
    }
}
