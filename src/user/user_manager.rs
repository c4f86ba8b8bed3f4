use super::auth::{Claims, CredentialsHasher, TokenIssuer, TokenPair};
use super::error::{UserError, UserResult};
use super::user_models::{User, UserResponse};
use super::user_store::UserStore;
use crate::library::EntityId;
use tracing::{debug, info};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn parse_id(id: &str) -> UserResult<EntityId> {
    EntityId::parse(id).map_err(|_| UserError::InvalidIdentifier(id.to_string()))
}

fn require_non_blank(field: &str, value: &str) -> UserResult<()> {
    if value.trim().is_empty() {
        return Err(UserError::InvalidPayload(format!(
            "The {} cannot be empty.",
            field
        )));
    }
    Ok(())
}

/// Users, credentials and the tokens issued for them.
pub struct UserManager {
    user_store: Box<dyn UserStore>,
    hasher: CredentialsHasher,
    tokens: TokenIssuer,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>, hasher: CredentialsHasher, tokens: TokenIssuer) -> Self {
        Self {
            user_store,
            hasher,
            tokens,
        }
    }

    fn require_user(&self, id: &str) -> UserResult<User> {
        let id = parse_id(id)?;
        self.user_store
            .get_user(&id)?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&self, login: &str, password: &str) -> UserResult<UserResponse> {
        require_non_blank("login", login)?;
        require_non_blank("password", password)?;

        let now = now_millis();
        let user = User {
            id: EntityId::generate(),
            login: login.to_string(),
            password_hash: self.hasher.hash(password)?,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.user_store.insert_user(&user)?;
        info!("Created user {} ({})", user.login, user.id);
        Ok(UserResponse::from(&user))
    }

    pub fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        Ok(self
            .user_store
            .list_users()?
            .iter()
            .map(UserResponse::from)
            .collect())
    }

    pub fn get_user(&self, id: &str) -> UserResult<UserResponse> {
        self.require_user(id).map(|user| UserResponse::from(&user))
    }

    pub fn update_password(
        &self,
        id: &str,
        old_password: &str,
        new_password: &str,
    ) -> UserResult<UserResponse> {
        require_non_blank("new password", new_password)?;
        let mut user = self.require_user(id)?;
        if !self.hasher.verify(old_password, &user.password_hash) {
            return Err(UserError::WrongPassword);
        }

        user.password_hash = self.hasher.hash(new_password)?;
        user.version += 1;
        user.updated_at = now_millis().max(user.created_at);
        if !self.user_store.update_user(&user)? {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        debug!("Updated password of user {}", user.id);
        Ok(UserResponse::from(&user))
    }

    pub fn delete_user(&self, id: &str) -> UserResult<()> {
        let id = parse_id(id)?;
        if !self.user_store.delete_user(&id)? {
            return Err(UserError::NotFound(id.to_string()));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Creates the user and signs them in.
    pub fn signup(&self, login: &str, password: &str) -> UserResult<(UserResponse, TokenPair)> {
        let created = self.create_user(login, password)?;
        let user = self.require_user(&created.id.to_string())?;
        let tokens = self.tokens.issue(&user)?;
        Ok((created, tokens))
    }

    pub fn login(&self, login: &str, password: &str) -> UserResult<TokenPair> {
        let user = self
            .user_store
            .find_user_by_login(login)?
            .ok_or(UserError::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }
        debug!("User {} logged in", user.login);
        self.tokens.issue(&user)
    }

    /// Exchanges a refresh token for a new pair. The user must still exist.
    pub fn refresh(&self, refresh_token: &str) -> UserResult<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let id = EntityId::parse(&claims.user_id).map_err(|_| UserError::InvalidToken)?;
        let user = self
            .user_store
            .get_user(&id)?
            .ok_or(UserError::InvalidToken)?;
        self.tokens.issue(&user)
    }

    pub fn authenticate(&self, access_token: &str) -> UserResult<Claims> {
        self.tokens.verify_access(access_token)
    }
}
