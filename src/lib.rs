// MangoPay client - authenticated transport for the MangoPay REST API

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod http_client;
pub mod models;
pub mod utils;

pub use auth::{AuthManager, InMemoryTokenStore, Token, TokenStore};
pub use config::Config;
pub use error::{MangoPayError, Result, TransportErrorKind};
pub use events::{NoopObserver, RequestErrored, RequestFinished, RequestObserver, RequestStarted};
pub use http_client::MangoPayClient;
pub use models::{ApiRequest, ApiResponse, RequestBody};
