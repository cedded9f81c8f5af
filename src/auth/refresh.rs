// Token endpoint call

use chrono::Utc;

use super::types::{Token, TokenResponse};
use crate::error::Result;
use crate::http_client::MangoPayClient;
use crate::models::ApiRequest;

/// Token endpoint, relative to the API root
pub const TOKEN_PATH: &str = "oauth/token";

/// Request a new access token with the client-credentials grant
pub async fn request_token(client: &MangoPayClient, basic_token: String) -> Result<Token> {
    tracing::info!("Requesting MangoPay access token...");

    let request = ApiRequest::post(TOKEN_PATH)
        .oauth()
        .form([("grant_type", "client_credentials")]);

    let response = client.dispatch(&request, basic_token).await?;

    // 404 with a JSON body passes classification elsewhere but never carries a token
    if !response.status.is_success() {
        return Err(client.api_failure(response));
    }

    let data: TokenResponse = match serde_json::from_slice(&response.body) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse token endpoint response");
            return Err(client.decode_failure(response));
        }
    };

    if data.access_token.is_empty() {
        tracing::error!("Token endpoint returned an empty access token");
        return Err(client.decode_failure(response));
    }

    let Some(token) = data.into_token(Utc::now()) else {
        tracing::error!("Token endpoint returned an out-of-range expiry");
        return Err(client.decode_failure(response));
    };

    tracing::info!(
        "MangoPay access token refreshed, expires: {}",
        token.expires_at.to_rfc3339()
    );

    Ok(token)
}
