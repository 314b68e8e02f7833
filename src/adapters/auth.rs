use crate::utils::error::{AppError, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Token 到期前多久就重新取得
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Assertion 有效期 (Google 上限一小時)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    DEFAULT_SERVICE_ACCOUNT_TOKEN_URI.to_string()
}

/// Service account credentials, either from a JSON key file or from discrete values.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    /// 環境變數中的 private key 常以字面 `\n` 儲存
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key.replace("\\n", "\n"),
            private_key_id: None,
            token_uri: default_token_uri(),
        }
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// 讀取 Google Cloud 下載的 JSON key file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| AppError::ConfigError {
            message: format!(
                "invalid service account key file {}: {}",
                path.as_ref().display(),
                e
            ),
        })
    }

    pub fn encoding_key(&self) -> Result<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            AppError::ConfigError {
                message: format!("invalid service account private key: {}", e),
            }
        })
    }

    /// RS256-signed JWT for the jwt-bearer grant.
    pub fn assertion(&self, issued_at: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        encode(&header, &claims, &self.encoding_key()?).map_err(|e| AppError::ConfigError {
            message: format!("cannot sign service account assertion: {}", e),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// 固定的 OAuth access token
    Static(String),
    /// Service account JWT 換取 token 並快取
    ServiceAccount(Box<ServiceAccountKey>),
    /// Metadata server 取得並快取
    Metadata { url: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Supplies the bearer token for Sheets API calls.
#[derive(Debug, Clone)]
pub struct AccessTokenProvider {
    source: TokenSource,
    client: Client,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl AccessTokenProvider {
    pub fn new(source: TokenSource, client: Client) -> Self {
        Self {
            source,
            client,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    fn token_request(&self) -> Result<Option<RequestBuilder>> {
        match &self.source {
            TokenSource::Static(_) => Ok(None),
            TokenSource::Metadata { url } => {
                tracing::debug!("🔑 Fetching access token from {}", url);
                Ok(Some(
                    self.client.get(url).header("Metadata-Flavor", "Google"),
                ))
            }
            TokenSource::ServiceAccount(key) => {
                tracing::debug!(
                    "🔑 Exchanging service account assertion for {} at {}",
                    key.client_email,
                    key.token_uri
                );
                let assertion = key.assertion(chrono::Utc::now().timestamp())?;
                Ok(Some(self.client.post(&key.token_uri).form(&[
                    ("grant_type", JWT_BEARER_GRANT),
                    ("assertion", assertion.as_str()),
                ])))
            }
        }
    }

    pub async fn token(&self) -> Result<String> {
        if let TokenSource::Static(token) = &self.source {
            return Ok(token.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.refresh_at {
                return Ok(entry.token.clone());
            }
        }

        let Some(request) = self.token_request()? else {
            return Err(AppError::ConfigError {
                message: "token source has no token endpoint".to_string(),
            });
        };
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("malformed token response: {}", e)))?;

        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(300));
        let refresh_at = Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN);
        let token = parsed.access_token;
        *cached = Some(CachedToken {
            token: token.clone(),
            refresh_at,
        });

        tracing::info!("✅ Access token refreshed (valid {}s)", lifetime.as_secs());
        Ok(token)
    }
}
