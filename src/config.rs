use reqwest::Url;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MangoPayError, Result};

/// Production API root
pub const DEFAULT_API_URL: &str = "https://api.mangopay.com/v2.01/";

/// Sandbox API root
pub const DEFAULT_API_SANDBOX_URL: &str = "https://api.sandbox.mangopay.com/v2.01/";

/// Default User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("MangoPay V2 Rust/", env!("CARGO_PKG_VERSION"));

/// Largest accepted token refresh threshold, in seconds
pub const MAX_TOKEN_REFRESH_THRESHOLD: u64 = 24 * 60 * 60;

/// Client configuration, passed explicitly to the client constructor
#[derive(Clone)]
pub struct Config {
    // Credentials
    pub client_id: String,
    pub passphrase: String,

    // Environment
    pub api_url: String,
    pub api_sandbox_url: String,
    pub sandbox: bool,

    // HTTP client
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_idle_connections: usize,
    pub proxy: Option<String>,
    pub user_agent: String,

    // Seconds before expiry at which a cached token is considered stale
    pub token_refresh_threshold: u64,
}

impl Config {
    /// Create a sandbox configuration with default settings
    pub fn new(client_id: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            passphrase: passphrase.into(),
            api_url: DEFAULT_API_URL.to_string(),
            api_sandbox_url: DEFAULT_API_SANDBOX_URL.to_string(),
            sandbox: true,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_idle_connections: 20,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token_refresh_threshold: 10,
        }
    }

    /// Load configuration from the environment (and `.env` if present)
    ///
    /// Required: `MANGOPAY_CLIENT_ID`, `MANGOPAY_PASSPHRASE`.
    /// Optional: `MANGOPAY_SANDBOX`, `MANGOPAY_API_URL`, `MANGOPAY_API_SANDBOX_URL`,
    /// `MANGOPAY_TIMEOUT`, `MANGOPAY_CONNECT_TIMEOUT`, `MANGOPAY_MAX_CONNECTIONS`,
    /// `MANGOPAY_PROXY`, `MANGOPAY_USER_AGENT`, `MANGOPAY_TOKEN_REFRESH_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("MANGOPAY_CLIENT_ID")
            .ok_or_else(|| MangoPayError::Config("MANGOPAY_CLIENT_ID is required".to_string()))?;
        let passphrase = lookup("MANGOPAY_PASSPHRASE")
            .ok_or_else(|| MangoPayError::Config("MANGOPAY_PASSPHRASE is required".to_string()))?;

        let mut config = Config::new(client_id, passphrase);

        if let Some(sandbox) = lookup("MANGOPAY_SANDBOX") {
            config.sandbox = parse_bool(&sandbox).ok_or_else(|| {
                MangoPayError::Config(format!("MANGOPAY_SANDBOX is not a boolean: {}", sandbox))
            })?;
        }
        if let Some(url) = lookup("MANGOPAY_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("MANGOPAY_API_SANDBOX_URL") {
            config.api_sandbox_url = url;
        }
        if let Some(secs) = lookup("MANGOPAY_TIMEOUT") {
            config.timeout = parse_seconds("MANGOPAY_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("MANGOPAY_CONNECT_TIMEOUT") {
            config.connect_timeout = parse_seconds("MANGOPAY_CONNECT_TIMEOUT", &secs)?;
        }

        if let Some(max) = lookup("MANGOPAY_MAX_CONNECTIONS") {
            config.max_idle_connections = parse_number("MANGOPAY_MAX_CONNECTIONS", &max)?;
        }

        config.proxy = lookup("MANGOPAY_PROXY").filter(|s| !s.is_empty());

        if let Some(user_agent) = lookup("MANGOPAY_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(secs) = lookup("MANGOPAY_TOKEN_REFRESH_THRESHOLD") {
            config.token_refresh_threshold =
                parse_number("MANGOPAY_TOKEN_REFRESH_THRESHOLD", &secs)?;
        }

        Ok(config)
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn api_sandbox_url(mut self, url: impl Into<String>) -> Self {
        self.api_sandbox_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn token_refresh_threshold(mut self, secs: u64) -> Self {
        self.token_refresh_threshold = secs;
        self
    }

    /// API root for the selected environment
    pub fn base_url(&self) -> &str {
        if self.sandbox {
            &self.api_sandbox_url
        } else {
            &self.api_url
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(MangoPayError::Config("client id must not be empty".to_string()));
        }
        if self.passphrase.is_empty() {
            return Err(MangoPayError::Config("passphrase must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(MangoPayError::Config("timeout must be greater than zero".to_string()));
        }
        if self.token_refresh_threshold > MAX_TOKEN_REFRESH_THRESHOLD {
            return Err(MangoPayError::Config(format!(
                "token refresh threshold must be at most {} seconds",
                MAX_TOKEN_REFRESH_THRESHOLD
            )));
        }

        let base_url = self.base_url();
        Url::parse(base_url)
            .map_err(|e| MangoPayError::Config(format!("invalid API URL {}: {}", base_url, e)))?;
        if !base_url.ends_with('/') {
            return Err(MangoPayError::Config(format!(
                "API URL must end with '/': {}",
                base_url
            )));
        }

        if let Some(ref proxy) = self.proxy {
            Url::parse(proxy)
                .map_err(|e| MangoPayError::Config(format!("invalid proxy URL {}: {}", proxy, e)))?;
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("passphrase", &"***")
            .field("api_url", &self.api_url)
            .field("api_sandbox_url", &self.api_sandbox_url)
            .field("sandbox", &self.sandbox)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("proxy", &self.proxy)
            .field("user_agent", &self.user_agent)
            .field("token_refresh_threshold", &self.token_refresh_threshold)
            .finish()
    }
}

/// Parse a boolean flag from string
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a (possibly fractional) number of seconds
fn parse_seconds(name: &str, s: &str) -> Result<Duration> {
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| MangoPayError::Config(format!("{} is not a number of seconds: {}", name, s)))
}

/// Parse an integer setting
fn parse_number<T: FromStr>(name: &str, s: &str) -> Result<T> {
    s.trim()
        .parse()
        .map_err(|_| MangoPayError::Config(format!("{} is not a valid number: {}", name, s)))
}
