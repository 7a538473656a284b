use async_trait::async_trait;
use log::{ debug, error, info };
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::{ Duration, Instant };
use tokio::sync::Mutex;

use crate::error::RelayError;

/// Margin subtracted from the reported token lifetime so a token is never
/// presented to watsonx moments before it lapses.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of short-lived bearer tokens for the provider call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer(&self) -> Result<String, RelayError>;
}

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Exchanges the long-lived IBM Cloud API key for an IAM bearer token.
///
/// Tokens are cached until shortly before expiry; the cache lock is held
/// across the refresh call so concurrent requests share one exchange instead
/// of each hitting IAM.
pub struct IamTokenProvider {
    http: HttpClient,
    iam_url: String,
    api_key: String,
    cached: Mutex<Option<CachedToken>>,
}

impl IamTokenProvider {
    pub fn new(
        iam_url: String,
        api_key: String,
        timeout: Duration
    ) -> Result<Self, RelayError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Auth(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, iam_url, api_key, cached: Mutex::new(None) })
    }

    async fn fetch_token(&self) -> Result<CachedToken, RelayError> {
        let params = [
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", self.api_key.as_str()),
        ];

        let resp = self.http
            .post(&self.iam_url)
            .form(&params)
            .send().await
            .map_err(|e| RelayError::Auth(format!("IAM request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            // The body may carry an IAM error code worth logging, but the
            // API key itself is never echoed back by IAM.
            let body = resp.text().await.unwrap_or_default();
            error!("IAM rejected the token exchange: {} {}", status, body);
            return Err(RelayError::Auth(format!("IAM returned {}: {}", status, body)));
        }

        let token: IamTokenResponse = resp
            .json().await
            .map_err(|e| RelayError::Auth(format!("invalid IAM response body: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(0));
        let expires_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
        info!("Token acquired (lifetime {}s)", lifetime.as_secs());

        Ok(CachedToken { value: token.access_token, expires_at })
    }
}

#[async_trait]
impl TokenSource for IamTokenProvider {
    async fn bearer(&self) -> Result<String, RelayError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                debug!("Reusing cached IAM token");
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}
