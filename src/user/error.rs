use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Identifier '{0}' is not valid")]
    InvalidIdentifier(String),

    #[error("User with id {0} not found")]
    NotFound(String),

    #[error("User with login '{0}' already exists")]
    LoginTaken(String),

    #[error("{0}")]
    InvalidPayload(String),

    #[error("Old password is wrong")]
    WrongPassword,

    #[error("Login or password is wrong")]
    InvalidCredentials,

    #[error("Token is invalid or expired")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("User store lock poisoned")]
    Poisoned,
}

pub type UserResult<T> = Result<T, UserError>;
