use super::error::{UserError, UserResult};
use super::user_models::User;
use super::user_store::UserStore;
use crate::library::EntityId;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_database, Column, SqlType, Table, VersionedSchema,
};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("login", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", &SqlType::Text, non_null = true),
        sqlite_column!(
            "version",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USER_TABLE_V_0],
    migration: None,
}];

const USER_COLUMNS: &str = "id, login, password_hash, version, created_at, updated_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        password_hash: row.get(2)?,
        version: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_database(db_path.as_ref(), USER_VERSIONED_SCHEMAS)?;
        info!("Opened user database {:?}", db_path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> UserResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| UserError::Poisoned)
    }

    fn find_one(&self, column: &str, value: &dyn rusqlite::ToSql) -> UserResult<Option<User>> {
        let user = self
            .lock()?
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE {} = ?1",
                    USER_COLUMNS, USER_TABLE_V_0.name, column
                ),
                params![value],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

impl UserStore for SqliteUserStore {
    fn insert_user(&self, user: &User) -> UserResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let taken = tx
            .query_row(
                "SELECT 1 FROM user WHERE login = ?1",
                params![user.login],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(UserError::LoginTaken(user.login.clone()));
        }
        tx.execute(
            &format!(
                "INSERT INTO user ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                USER_COLUMNS
            ),
            params![
                user.id,
                user.login,
                user.password_hash,
                user.version,
                user.created_at,
                user.updated_at
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_user(&self, id: &EntityId) -> UserResult<Option<User>> {
        self.find_one("id", id)
    }

    fn find_user_by_login(&self, login: &str) -> UserResult<Option<User>> {
        self.find_one("login", &login)
    }

    fn list_users(&self) -> UserResult<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM user ORDER BY rowid",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn update_user(&self, user: &User) -> UserResult<bool> {
        let changed = self.lock()?.execute(
            "UPDATE user SET login = ?2, password_hash = ?3, version = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                user.id,
                user.login,
                user.password_hash,
                user.version,
                user.updated_at
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_user(&self, id: &EntityId) -> UserResult<bool> {
        let changed = self
            .lock()?
            .execute("DELETE FROM user WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
