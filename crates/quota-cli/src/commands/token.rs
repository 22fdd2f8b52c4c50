//! Client-credentials exchange against the deployed demo proxy.

use quota_edge::{AccessTokenResponse, Credential, EdgeError, EdgeResult, basic_authorization};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::demo::DemoConfig;
use crate::output::{TOKEN_PATH, TOKEN_REQUEST_BODY};

const OPERATION: &str = "token.client_credentials";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Exchange the app's key and secret for an access token.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, an undecodable body, or a
/// response without `access_token`. Nothing is retried.
pub async fn fetch_token(
    http: &Client,
    config: &DemoConfig,
    credential: &Credential,
) -> EdgeResult<String> {
    let url = config.proxy_url(TOKEN_PATH);
    debug!(url = url.as_str(), "requesting access token");
    let response = http
        .post(url)
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .header(
            AUTHORIZATION,
            basic_authorization(&credential.consumer_key, &credential.consumer_secret),
        )
        .header(ACCEPT, "application/json")
        .body(TOKEN_REQUEST_BODY)
        .send()
        .await
        .map_err(|source| EdgeError::Transport {
            operation: OPERATION,
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EdgeError::status(OPERATION, status, body));
    }

    let body = response
        .json::<AccessTokenResponse>()
        .await
        .map_err(|source| EdgeError::Decode {
            operation: OPERATION,
            source,
        })?;
    let token = body
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(EdgeError::Authentication {
            reason: "token response did not include an access token",
        })?;
    info!(token_type = body.token_type.as_deref().unwrap_or("unknown"), "token acquired");
    Ok(token)
}
