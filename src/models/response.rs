use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::{MangoPayError, Result};

/// Successful API response: parsed body plus metadata
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub elapsed: Duration,
    /// `None` for 204 No Content
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    /// Deserialize the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }

    /// Deserialize the body, failing with a decode error if there is none
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self.body {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Err(MangoPayError::Decode {
                status: self.status.as_u16(),
                headers: self.headers,
                text: String::new(),
                content: None,
            }),
        }
    }
}
