//! User data models

use crate::library::EntityId;
use serde::{Deserialize, Serialize};

/// A stored user. The password is only ever held as a PHC hash string.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: EntityId,
    pub login: String,
    pub password_hash: String,
    /// Starts at 1, bumped on every password change.
    pub version: u32,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
}

/// What the API returns for a user: everything but the password.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: EntityId,
    pub login: String,
    pub version: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            login: user.login.clone(),
            version: user.version,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateUserRequest {
    pub login: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}
