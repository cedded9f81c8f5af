use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Client, Method, Proxy, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::{AuthManager, Credentials, InMemoryTokenStore, TokenStore};
use crate::config::Config;
use crate::error::{MangoPayError, Result, TransportErrorKind};
use crate::events::{
    NoopObserver, RequestErrored, RequestFinished, RequestObserver, RequestStarted,
};
use crate::models::{ApiRequest, ApiResponse, RequestBody};
use crate::utils::{redact_headers, truncate_json, LOG_TRUNCATE_CHARS};

const IDEMPOTENCY_KEY: HeaderName = HeaderName::from_static("idempotency-key");
const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Per-request context shared by logging and observer events
struct RequestContext {
    url: Url,
    method: Method,
    headers: HeaderMap,
    data: Option<Value>,
}

/// Fully read response, before status classification
pub(crate) struct RawResponse {
    ctx: RequestContext,
    pub(crate) status: StatusCode,
    headers: HeaderMap,
    pub(crate) body: Vec<u8>,
    elapsed: Duration,
}

impl RawResponse {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn into_response(self, body: Option<Value>) -> ApiResponse {
        ApiResponse {
            status: self.status,
            headers: self.headers,
            url: self.ctx.url,
            elapsed: self.elapsed,
            body,
        }
    }
}

/// HTTP client for the MangoPay API
pub struct MangoPayClient {
    /// Connection pool, owned by this client
    client: Client,

    config: Config,

    auth_manager: AuthManager,

    observer: Arc<dyn RequestObserver>,
}

impl std::fmt::Debug for MangoPayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MangoPayClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MangoPayClient {
    /// Create a client with a connection pool built from the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = build_http_client(&config)?;
        Self::with_http_client(config, client)
    }

    /// Create a client around an existing connection pool
    pub fn with_http_client(config: Config, client: Client) -> Result<Self> {
        config.validate()?;

        let auth_manager = AuthManager::new(
            Credentials::new(config.client_id.clone(), config.passphrase.clone()),
            config.base_url(),
            Arc::new(InMemoryTokenStore::new()),
            config.token_refresh_threshold,
        );

        Ok(Self {
            client,
            config,
            auth_manager,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replace the token store (e.g. with one shared between clients)
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.auth_manager = AuthManager::new(
            Credentials::new(
                self.config.client_id.clone(),
                self.config.passphrase.clone(),
            ),
            self.config.base_url(),
            store,
            self.config.token_refresh_threshold,
        );
        self
    }

    /// Install a receiver for request lifecycle events
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn auth_manager(&self) -> &AuthManager {
        &self.auth_manager
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Current bearer authorization value, refreshing it if needed
    pub async fn token(&self) -> Result<String> {
        self.auth_manager.get_token(self).await
    }

    /// Send an API request and decode the response
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let authorization = if request.oauth {
            self.auth_manager.basic_token()
        } else {
            self.auth_manager.get_token(self).await?
        };

        self.execute(&request, authorization).await
    }

    /// Dispatch a request and classify the response
    async fn execute(
        &self,
        request: &ApiRequest,
        authorization: String,
    ) -> Result<ApiResponse> {
        let raw = self.dispatch(request, authorization).await?;

        match raw.status.as_u16() {
            204 => Ok(raw.into_response(None)),

            200 | 201 | 202 | 404 => {
                if raw.body.is_empty() {
                    return Err(self.decode_failure(raw));
                }

                match serde_json::from_slice::<Value>(&raw.body) {
                    Ok(body) => Ok(raw.into_response(Some(body))),
                    Err(_) => Err(self.decode_failure(raw)),
                }
            }

            _ => Err(self.api_failure(raw)),
        }
    }

    /// Send a request with an already resolved Authorization value and read the whole body
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
        authorization: String,
    ) -> Result<RawResponse> {
        let url = self.build_url(request)?;
        let headers = self.build_headers(request, &authorization)?;

        let json_payload = match request.body {
            Some(RequestBody::Json(ref value)) => Some(serde_json::to_vec(value)?),
            _ => None,
        };

        let ctx = RequestContext {
            url,
            method: request.method.clone(),
            headers,
            data: logged_body(request),
        };

        tracing::debug!(
            method = %ctx.method,
            url = %ctx.url,
            headers = ?redact_headers(&ctx.headers),
            content = ?ctx.data,
            "Sending MangoPay request"
        );

        self.observer.request_started(&RequestStarted {
            url: ctx.url.to_string(),
            method: ctx.method.clone(),
            data: ctx.data.clone(),
            headers: ctx.headers.clone(),
        });

        let mut builder = self
            .client
            .request(ctx.method.clone(), ctx.url.clone())
            .headers(ctx.headers.clone())
            .timeout(self.config.timeout);

        if let Some(payload) = json_payload {
            builder = builder.body(payload);
        } else if let Some(RequestBody::Form(ref pairs)) = request.body {
            builder = builder.form(pairs);
        }

        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.transport_failure(&ctx, &e)),
        };

        let status = response.status();
        let response_headers = response.headers().clone();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.transport_failure(&ctx, &e)),
        };

        let elapsed = started.elapsed();

        self.observer.request_finished(&RequestFinished {
            url: ctx.url.to_string(),
            method: ctx.method.clone(),
            data: ctx.data.clone(),
            headers: ctx.headers.clone(),
            status: status.as_u16(),
            elapsed,
        });

        tracing::debug!(
            url = %ctx.url,
            elapsed_secs = elapsed.as_secs_f64(),
            status = status.as_u16(),
            headers = ?response_headers,
            content = %String::from_utf8_lossy(&bytes),
            "Received MangoPay response"
        );

        Ok(RawResponse {
            ctx,
            status,
            headers: response_headers,
            body: bytes.to_vec(),
            elapsed,
        })
    }

    /// OAuth calls live under the API root, everything else under the client id
    fn build_url(&self, request: &ApiRequest) -> Result<Url> {
        let base_url = self.config.base_url();
        let raw = if request.oauth {
            format!("{}{}", base_url, request.path)
        } else {
            format!("{}{}{}", base_url, self.config.client_id, request.path)
        };

        let mut url =
            Url::parse(&raw).map_err(|e| MangoPayError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }

        Ok(url)
    }

    fn build_headers(&self, request: &ApiRequest, authorization: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, header_value("User-Agent", &self.config.user_agent)?);

        let content_type = if request.oauth {
            CONTENT_TYPE_FORM
        } else {
            CONTENT_TYPE_JSON
        };
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        let mut auth_value = header_value("Authorization", authorization)?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        if let Some(ref key) = request.idempotency_key {
            headers.insert(IDEMPOTENCY_KEY, header_value("Idempotency-Key", key)?);
        }

        Ok(headers)
    }

    fn transport_failure(&self, ctx: &RequestContext, err: &reqwest::Error) -> MangoPayError {
        let kind = TransportErrorKind::of(err);

        tracing::error!(
            error_kind = %kind,
            error = %err,
            error_debug = ?err,
            method = %ctx.method,
            url = %ctx.url,
            content = ?ctx.data,
            "MangoPay request failed before a response was received"
        );

        self.observer.request_errored(&RequestErrored {
            url: ctx.url.to_string(),
            method: ctx.method.clone(),
            status: None,
            headers: ctx.headers.clone(),
            transport_error: Some(kind),
        });

        MangoPayError::transport(err)
    }

    /// Log and report a response whose status is an API error
    pub(crate) fn api_failure(&self, raw: RawResponse) -> MangoPayError {
        let text = raw.text();

        tracing::error!(
            status = raw.status.as_u16(),
            url = %raw.ctx.url,
            method = %raw.ctx.method,
            data = ?raw.ctx.data,
            headers = ?raw.headers,
            content = %text,
            "MangoPay API error"
        );

        self.observer.request_errored(&RequestErrored {
            url: raw.ctx.url.to_string(),
            method: raw.ctx.method.clone(),
            status: Some(raw.status.as_u16()),
            headers: raw.headers,
            transport_error: None,
        });

        let content = serde_json::from_str(&text).ok();

        MangoPayError::Api {
            status: raw.status.as_u16(),
            text,
            content,
        }
    }

    /// Log and report a response whose body could not be decoded
    pub(crate) fn decode_failure(&self, raw: RawResponse) -> MangoPayError {
        let text = raw.text();

        tracing::error!(
            status = raw.status.as_u16(),
            url = %raw.ctx.url,
            method = %raw.ctx.method,
            headers = ?raw.headers,
            content = %text,
            "Failed to decode MangoPay response"
        );

        self.observer.request_errored(&RequestErrored {
            url: raw.ctx.url.to_string(),
            method: raw.ctx.method.clone(),
            status: Some(raw.status.as_u16()),
            headers: raw.headers.clone(),
            transport_error: None,
        });

        let content = serde_json::from_str(&text).ok();

        MangoPayError::Decode {
            status: raw.status.as_u16(),
            headers: raw.headers,
            text,
            content,
        }
    }
}

/// Build the connection pool described by the configuration
fn build_http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(config.max_idle_connections)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout);

    if let Some(ref proxy) = config.proxy {
        let proxy = Proxy::all(proxy)
            .map_err(|e| MangoPayError::Config(format!("invalid proxy {}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| MangoPayError::Config(format!("Failed to create HTTP client: {}", e)))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| MangoPayError::InvalidHeader(format!("{} contains invalid characters", name)))
}

/// Truncated copy of the request body for logs and events
fn logged_body(request: &ApiRequest) -> Option<Value> {
    match request.body {
        Some(RequestBody::Json(ref value)) => Some(truncate_json(value, LOG_TRUNCATE_CHARS)),
        Some(RequestBody::Form(ref pairs)) => Some(Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )),
        None => None,
    }
}
