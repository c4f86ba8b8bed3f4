use super::error::ApiResult;
use super::session::Session;
use super::state::{GuardedUserManager, ServerState};
use super::validation::JsonBody;
use crate::user::{CreateUserRequest, UpdatePasswordRequest, UserResponse};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::debug;

async fn list_users(
    _session: Session,
    State(user_manager): State<GuardedUserManager>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    Ok(Json(user_manager.list_users()?))
}

async fn get_user(
    _session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(user_manager.get_user(&id)?))
}

async fn post_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = user_manager.create_user(&body.login, &body.password)?;
    debug!("User {} created by {}", user.login, session.login);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn put_user(
    _session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdatePasswordRequest>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(user_manager.update_password(
        &id,
        &body.old_password,
        &body.new_password,
    )?))
}

async fn delete_user(
    session: Session,
    State(user_manager): State<GuardedUserManager>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user_manager.delete_user(&id)?;
    debug!("User {} deleted by {}", id, session.login);
    Ok(StatusCode::NO_CONTENT)
}

pub fn make_user_routes(state: ServerState) -> Router {
    Router::new()
        .route("/user", get(list_users).post(post_user))
        .route(
            "/user/{id}",
            get(get_user).put(put_user).delete(delete_user),
        )
        .with_state(state)
}
