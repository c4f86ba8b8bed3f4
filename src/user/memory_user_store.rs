use super::error::{UserError, UserResult};
use super::user_models::User;
use super::user_store::UserStore;
use crate::library::EntityId;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Volatile user store, kept in creation order.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> UserResult<RwLockReadGuard<'_, Vec<User>>> {
        self.users.read().map_err(|_| UserError::Poisoned)
    }

    fn write(&self) -> UserResult<RwLockWriteGuard<'_, Vec<User>>> {
        self.users.write().map_err(|_| UserError::Poisoned)
    }
}

impl UserStore for InMemoryUserStore {
    fn insert_user(&self, user: &User) -> UserResult<()> {
        let mut users = self.write()?;
        if users.iter().any(|u| u.login == user.login) {
            return Err(UserError::LoginTaken(user.login.clone()));
        }
        users.push(user.clone());
        Ok(())
    }

    fn get_user(&self, id: &EntityId) -> UserResult<Option<User>> {
        Ok(self.read()?.iter().find(|u| &u.id == id).cloned())
    }

    fn find_user_by_login(&self, login: &str) -> UserResult<Option<User>> {
        Ok(self.read()?.iter().find(|u| u.login == login).cloned())
    }

    fn list_users(&self) -> UserResult<Vec<User>> {
        Ok(self.read()?.clone())
    }

    fn update_user(&self, user: &User) -> UserResult<bool> {
        let mut users = self.write()?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_user(&self, id: &EntityId) -> UserResult<bool> {
        let mut users = self.write()?;
        let before = users.len();
        users.retain(|u| &u.id != id);
        Ok(users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::user_store_tests::user_store_tests;

    user_store_tests!((InMemoryUserStore::new(), ()));
}
