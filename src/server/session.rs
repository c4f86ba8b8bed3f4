use super::error::ApiError;
use super::state::ServerState;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

/// The caller behind a valid access token.
#[derive(Debug)]
pub struct Session {
    pub login: String,
}

pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

fn extract_bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(HEADER_SESSION_TOKEN_KEY)?;
    let value = String::from_utf8_lossy(value.as_bytes());
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_bearer_token(parts) {
            Some(token) => token,
            None => {
                debug!("No bearer token in headers.");
                return Err(ApiError::unauthorized("Authorization header is missing"));
            }
        };

        match ctx.user_manager.authenticate(&token) {
            Ok(claims) => Ok(Session {
                login: claims.login,
            }),
            Err(err) => {
                debug!("Rejected access token: {}", err);
                Err(ApiError::unauthorized("Access token is invalid or expired"))
            }
        }
    }
}
