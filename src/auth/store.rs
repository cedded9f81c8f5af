// Token storage strategies

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::types::Token;
use crate::error::Result;

/// Pluggable storage for cached tokens.
///
/// Keys identify a client/environment pair so a single store can be shared
/// between several clients.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the token stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Token>>;

    /// Store (or overwrite) the token under `key`
    async fn set(&self, key: &str, token: &Token) -> Result<()>;

    /// Remove the token under `key`
    async fn clear(&self, key: &str) -> Result<()>;
}

/// Thread-safe in-memory token store (default)
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<DashMap<String, Token>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<Token>> {
        Ok(self.tokens.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, token: &Token) -> Result<()> {
        self.tokens.insert(key.to_string(), token.clone());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.tokens.remove(key);
        Ok(())
    }
}
