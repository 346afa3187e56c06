use crate::{Context, Error, Result, context::error_body};
use log::info;
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthResponse {
    auth_token: String,
}

/// Fetch the license server token from the configured auth endpoint.
pub fn fetch_auth_token(ctx: &Context) -> Result<String> {
    info!("Requesting auth token");

    let response = ctx
        .client
        .get(ctx.config.auth_url.clone())
        .send()
        .map_err(|x| Error::AuthTokenUnavailable(x.to_string()))?;
    let status = response.status();

    if !status.is_success() {
        return Err(Error::AuthTokenUnavailable(format!(
            "auth endpoint responded with {}: '{}'",
            status,
            error_body(response)
        )));
    }

    let body = response
        .json::<AuthResponse>()
        .map_err(|x| Error::AuthTokenUnavailable(format!("unexpected response body: {}", x)))?;

    if body.auth_token.is_empty() {
        return Err(Error::AuthTokenUnavailable("auth_token is empty".to_owned()));
    }

    Ok(body.auth_token)
}
