// Error handling module
// Normalizes transport failures and HTTP responses into typed errors

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Category of a failure that happened before any HTTP response was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Other,
}

impl TransportErrorKind {
    /// Categorize a reqwest error
    pub fn of(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_request() {
            Self::Request
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Connect => "ConnectionError",
            Self::Request => "RequestError",
            Self::Body => "BodyError",
            Self::Other => "TransportError",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the MangoPay client
#[derive(Error, Debug)]
pub enum MangoPayError {
    /// Connection failure or timeout, no HTTP response was obtained
    #[error("{message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    /// Non-success HTTP status returned by the API
    #[error("MangoPay API error: {status} - {text}")]
    Api {
        status: u16,
        text: String,
        content: Option<Value>,
    },

    /// Success status but the body was missing or not valid JSON
    #[error("Failed to decode MangoPay response: {status} - {text}")]
    Decode {
        status: u16,
        headers: HeaderMap,
        text: String,
        content: Option<Value>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Token store failure
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Body serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MangoPayError {
    /// Build a transport error from a reqwest failure, prefixing the cause type
    pub fn transport(err: &reqwest::Error) -> Self {
        let kind = TransportErrorKind::of(err);
        let mut text = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = std::error::Error::source(cause);
        }
        let message = if text.is_empty() {
            kind.as_str().to_string()
        } else {
            format!("{}: {}", kind, text)
        };
        Self::Transport { kind, message }
    }

    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Parsed JSON body of an API or decode error
    pub fn content(&self) -> Option<&Value> {
        match self {
            Self::Api { content, .. } | Self::Decode { content, .. } => content.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, MangoPayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_messages() {
        let err = MangoPayError::Api {
            status: 500,
            text: "Internal error".to_string(),
            content: None,
        };
        assert_eq!(err.to_string(), "MangoPay API error: 500 - Internal error");

        let err = MangoPayError::Config("Missing client id".to_string());
        assert_eq!(err.to_string(), "Configuration error: Missing client id");

        let err = MangoPayError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "Timeout: operation timed out".to_string(),
        };
        assert_eq!(err.to_string(), "Timeout: operation timed out");
    }

    #[test]
    fn test_status_accessor() {
        let err = MangoPayError::Decode {
            status: 404,
            headers: HeaderMap::new(),
            text: String::new(),
            content: None,
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transport());

        let err = MangoPayError::Transport {
            kind: TransportErrorKind::Connect,
            message: "ConnectionError".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(err.is_transport());
    }

    #[test]
    fn test_content_accessor() {
        let err = MangoPayError::Api {
            status: 400,
            text: r#"{"Message":"One or several required parameters are missing"}"#.to_string(),
            content: Some(json!({"Message": "One or several required parameters are missing"})),
        };
        assert_eq!(
            err.content().unwrap()["Message"],
            "One or several required parameters are missing"
        );

        let err = MangoPayError::Storage("poisoned".to_string());
        assert!(err.content().is_none());
    }

    #[test]
    fn test_transport_kind_names() {
        assert_eq!(TransportErrorKind::Timeout.to_string(), "Timeout");
        assert_eq!(TransportErrorKind::Connect.to_string(), "ConnectionError");
        assert_eq!(TransportErrorKind::Other.as_str(), "TransportError");
    }
}
