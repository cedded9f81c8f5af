use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::refresh;
use super::store::TokenStore;
use super::types::{Credentials, Token};
use crate::error::Result;
use crate::http_client::MangoPayClient;

/// Authentication manager
/// Caches the bearer token in a pluggable store and refreshes it when stale
pub struct AuthManager {
    /// Client credentials
    credentials: Credentials,

    /// Token cache
    store: Arc<dyn TokenStore>,

    /// Key of this client/environment in the store
    store_key: String,

    /// Seconds before expiry at which the token is refreshed
    refresh_threshold: Duration,

    /// Serializes refreshes so concurrent callers share one token request
    refresh_lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        credentials: Credentials,
        base_url: &str,
        store: Arc<dyn TokenStore>,
        refresh_threshold: u64,
    ) -> Self {
        let store_key = format!("{}@{}", credentials.client_id, base_url);

        Self {
            credentials,
            store,
            store_key,
            refresh_threshold: i64::try_from(refresh_threshold)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Basic authorization header value built from the credentials
    pub fn basic_token(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.passphrase
        );
        format!("Basic {}", STANDARD.encode(raw))
    }

    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    /// Cached token, if present and not stale
    pub async fn cached_token(&self) -> Result<Option<Token>> {
        let token = self.store.get(&self.store_key).await?;
        Ok(token.filter(|t| !t.is_stale(self.refresh_threshold)))
    }

    /// Get a valid bearer authorization value, refreshing if necessary
    pub async fn get_token(&self, client: &MangoPayClient) -> Result<String> {
        if let Some(token) = self.cached_token().await? {
            return Ok(token.authorization());
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached_token().await? {
            tracing::debug!("Using token refreshed by a concurrent request");
            return Ok(token.authorization());
        }

        let token = self.refresh_token(client).await?;
        Ok(token.authorization())
    }

    /// Drop the cached token so the next call refreshes it
    pub async fn invalidate(&self) -> Result<()> {
        tracing::debug!("Invalidating cached MangoPay token");
        self.store.clear(&self.store_key).await
    }

    async fn refresh_token(&self, client: &MangoPayClient) -> Result<Token> {
        tracing::debug!("Refreshing access token...");

        let token = refresh::request_token(client, self.basic_token())
            .await
            .inspect_err(|e| tracing::error!("Token refresh failed: {}", e))?;

        self.store.set(&self.store_key, &token).await?;
        Ok(token)
    }
}
