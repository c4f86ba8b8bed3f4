//! Public endpoints that hand out tokens.

use super::error::{ApiError, ApiResult};
use super::state::{GuardedUserManager, ServerState};
use super::validation::{JsonBody, Validate};
use crate::library::EntityId;
use crate::user::{CreateUserRequest, TokenPair, UserError};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub login: String,
    pub password: String,
}

impl Validate for LoginBody {
    fn validate(&self) -> Result<(), String> {
        if self.login.trim().is_empty() || self.password.is_empty() {
            return Err("Login and password are required.".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// A missing token is reported by the handler as 401, not as a bad payload.
impl Validate for RefreshBody {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupResponse {
    id: EntityId,
    #[serde(flatten)]
    tokens: TokenPair,
}

async fn signup(
    State(user_manager): State<GuardedUserManager>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let (user, tokens) = match user_manager.signup(&body.login, &body.password) {
        Ok(created) => created,
        Err(UserError::LoginTaken(login)) => {
            return Err(ApiError::forbidden(format!(
                "User with login '{}' already exists",
                login
            )))
        }
        Err(err) => return Err(err.into()),
    };
    debug!("Signed up {}", user.login);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            tokens,
        }),
    ))
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    JsonBody(body): JsonBody<LoginBody>,
) -> ApiResult<Json<TokenPair>> {
    debug!("login() called for {}", body.login);
    Ok(Json(user_manager.login(&body.login, &body.password)?))
}

async fn refresh(
    State(user_manager): State<GuardedUserManager>,
    JsonBody(body): JsonBody<RefreshBody>,
) -> ApiResult<Json<TokenPair>> {
    let token = body
        .refresh_token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token is missing"))?;
    Ok(Json(user_manager.refresh(&token)?))
}

pub fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .with_state(state)
}
