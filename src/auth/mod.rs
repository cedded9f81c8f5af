// Authentication module
// Manages bearer token lifecycle and token storage

mod manager;
mod refresh;
mod store;
mod types;

pub use manager::AuthManager;
pub use refresh::TOKEN_PATH;
pub use store::{InMemoryTokenStore, TokenStore};
pub use types::{Credentials, Token, TokenResponse};
