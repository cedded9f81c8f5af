use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// Outgoing request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON (`application/json`)
    Json(Value),
    /// Form-encoded pairs, used by the token endpoint
    Form(Vec<(String, String)>),
}

/// Description of a single API call, built per request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the client root, e.g. `/users/`
    pub path: String,
    pub body: Option<RequestBody>,
    pub idempotency_key: Option<String>,
    /// Token endpoint call: basic auth, no client id prefix
    pub oauth: bool,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            idempotency_key: None,
            oauth: false,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach any serializable value as JSON body
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        Ok(self.body(serde_json::to_value(body)?))
    }

    /// Attach a form-encoded body
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Attach a freshly generated idempotency key
    pub fn with_generated_idempotency_key(self) -> Self {
        self.idempotency_key(Uuid::new_v4().to_string())
    }

    /// Add a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Mark as a token endpoint call
    pub fn oauth(mut self) -> Self {
        self.oauth = true;
        self
    }

    pub fn json_body(&self) -> Option<&Value> {
        match self.body {
            Some(RequestBody::Json(ref value)) => Some(value),
            _ => None,
        }
    }
}
