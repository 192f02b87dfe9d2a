//! Access token handling.
//!
//! Every remote call reads the current bearer token from a shared
//! [`AuthHandle`]. The handle holds an immutable [`AccessToken`] snapshot that
//! is swapped wholesale on refresh, so readers see either the old or the new
//! token, never a mix. Callers take a snapshot per request and never keep a
//! lock across an `.await` (the `parking_lot` guards are `!Send`, so the
//! compiler enforces this inside spawned tasks).
//!
//! The authorization-code login happens elsewhere; this module only exchanges
//! a refresh token for fresh access tokens, once at startup and then on a
//! fixed interval from a background task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::spotify::{SpotifyError, TokenGrant, dto};

/// An immutable access token snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Bearer token value
    pub value: String,
    /// Increments on every refresh
    pub version: u64,
    /// When this token was obtained
    pub obtained_at: DateTime<Utc>,
}

/// Shared, atomically replaced access token.
#[derive(Debug, Clone, Default)]
pub struct AuthHandle {
    current: Arc<RwLock<Option<Arc<AccessToken>>>>,
}

impl AuthHandle {
    /// A handle with no token yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A handle seeded with a token.
    pub fn with_token(value: impl Into<String>) -> Self {
        let handle = Self::empty();
        handle.replace(value);
        handle
    }

    /// The current token snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<AccessToken>> {
        self.current.read().clone()
    }

    /// The `Authorization` header value for the current token.
    pub fn bearer(&self) -> Result<String, SpotifyError> {
        self.snapshot()
            .map(|token| format!("Bearer {}", token.value))
            .ok_or(SpotifyError::MissingToken)
    }

    /// Swap in a new token, returning its version.
    pub fn replace(&self, value: impl Into<String>) -> u64 {
        let mut guard = self.current.write();
        let version = guard.as_ref().map_or(1, |t| t.version + 1);
        *guard = Some(Arc::new(AccessToken {
            value: value.into(),
            version,
            obtained_at: Utc::now(),
        }));
        version
    }
}

/// Something that can mint a fresh access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<TokenGrant, SpotifyError>;
}

/// Exchanges a refresh token at the accounts service.
pub struct TokenRefresher {
    http_client: reqwest::Client,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: Mutex<String>,
}

impl TokenRefresher {
    pub fn new(
        accounts_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            accounts_url: accounts_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: Mutex::new(refresh_token.into()),
        }
    }

    /// Refresh-token grant against `{accounts_url}/api/token`.
    pub async fn refresh(&self) -> Result<TokenGrant, SpotifyError> {
        let refresh_token = self.refresh_token.lock().clone();
        let url = format!("{}/api/token", self.accounts_url.trim_end_matches('/'));
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| SpotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::status(status.as_u16(), body));
        }

        let grant = response
            .json::<dto::TokenResponse>()
            .await
            .map(crate::spotify::adapter::to_token_grant)
            .map_err(|e| SpotifyError::Parse(e.to_string()))?;

        if let Some(ref rotated) = grant.refresh_token {
            *self.refresh_token.lock() = rotated.clone();
        }
        Ok(grant)
    }
}

#[async_trait]
impl TokenSource for TokenRefresher {
    async fn fetch_token(&self) -> Result<TokenGrant, SpotifyError> {
        self.refresh().await
    }
}

/// Fetch a token once and install it in the handle.
pub async fn refresh_now(source: &dyn TokenSource, auth: &AuthHandle) -> Result<u64, SpotifyError> {
    let grant = source.fetch_token().await?;
    let version = auth.replace(grant.access_token);
    tracing::debug!("Installed access token v{}", version);
    Ok(version)
}

/// Refresh the token every `period` until the returned task is aborted.
///
/// Failures are logged and the previous token stays in place until the next
/// tick.
pub fn spawn_refresh_task(
    source: Arc<dyn TokenSource>,
    auth: AuthHandle,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the caller refreshed already.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match refresh_now(source.as_ref(), &auth).await {
                Ok(version) => tracing::info!("Refreshed access token (v{})", version),
                Err(e) => tracing::warn!("Access token refresh failed: {}", e),
            }
        }
    })
}
