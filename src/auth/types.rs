// Authentication types

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token lifetime assumed when the endpoint reports no expiry
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Client credentials, immutable after construction
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub passphrase: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            passphrase: passphrase.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("passphrase", &"***")
            .finish()
    }
}

/// Cached bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// True once the token is within `threshold` of its expiry
    pub fn is_stale(&self, threshold: Duration) -> bool {
        Utc::now()
            .checked_add_signed(threshold)
            .map_or(true, |deadline| deadline >= self.expires_at)
    }

    /// Authorization header value, e.g. `Bearer <token>`
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<i64>,
    /// Absolute expiry as a unix timestamp
    pub expires_at: Option<i64>,
}

impl TokenResponse {
    /// Convert into a token, resolving the expiry relative to `now`
    ///
    /// Returns `None` when the reported expiry is not a representable timestamp.
    pub fn into_token(self, now: DateTime<Utc>) -> Option<Token> {
        let expires_at = match self.expires_at {
            Some(ts) => Utc.timestamp_opt(ts, 0).single()?,
            None => {
                let lifetime =
                    Duration::try_seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN))?;
                now.checked_add_signed(lifetime)?
            }
        };

        Some(Token {
            access_token: self.access_token,
            token_type: self
                .token_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Bearer".to_string()),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_staleness() {
        let token = Token::new("abc", "Bearer", Utc::now() + Duration::seconds(600));
        assert!(!token.is_stale(Duration::seconds(10)));
        assert!(token.is_stale(Duration::seconds(900)));

        let expired = Token::new("abc", "Bearer", Utc::now() - Duration::seconds(1));
        assert!(expired.is_stale(Duration::zero()));
    }

    #[test]
    fn test_staleness_with_overflowing_threshold() {
        let token = Token::new("abc", "Bearer", Utc::now() + Duration::seconds(600));
        assert!(token.is_stale(Duration::MAX));
    }

    #[test]
    fn test_authorization_value() {
        let token = Token::new("abc123", "bearer", Utc::now());
        assert_eq!(token.authorization(), "bearer abc123");
    }

    #[test]
    fn test_response_with_expires_in() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"bearer","expires_in":1200}"#,
        )
        .unwrap();

        let token = response.into_token(now).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_at, now + Duration::seconds(1200));
    }

    #[test]
    fn test_response_with_expires_at() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_at":1767225600}"#).unwrap();

        let token = response.into_token(Utc::now()).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_at.timestamp(), 1767225600);
    }

    #[test]
    fn test_response_without_expiry() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        let token = response.into_token(now).unwrap();
        assert_eq!(token.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn test_response_with_unrepresentable_expiry() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":9223372036854775}"#)
                .unwrap();
        assert!(response.into_token(Utc::now()).is_none());

        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":9223372036854775807}"#)
                .unwrap();
        assert!(response.into_token(Utc::now()).is_none());

        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_at":9223372036854775807}"#)
                .unwrap();
        assert!(response.into_token(Utc::now()).is_none());
    }

    #[test]
    fn test_response_requires_access_token() {
        let parsed = serde_json::from_str::<TokenResponse>(r#"{"token_type":"bearer"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_credentials_debug_hides_passphrase() {
        let creds = Credentials::new("client", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
