use super::error::UserResult;
use super::user_models::User;
use crate::library::EntityId;

pub trait UserStore: Send + Sync {
    /// Stores a new user.
    /// Returns Err(LoginTaken) if another user already has the same login.
    fn insert_user(&self, user: &User) -> UserResult<()>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user(&self, id: &EntityId) -> UserResult<Option<User>>;

    /// Returns Ok(None) if no user has this login.
    fn find_user_by_login(&self, login: &str) -> UserResult<Option<User>>;

    /// All users, in creation order.
    fn list_users(&self) -> UserResult<Vec<User>>;

    /// Overwrites the stored user with the same id.
    /// Returns false if the user does not exist.
    fn update_user(&self, user: &User) -> UserResult<bool>;

    /// Returns false if the user does not exist.
    fn delete_user(&self, id: &EntityId) -> UserResult<bool>;
}
