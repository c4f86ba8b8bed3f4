use super::models::EntityKind;
use thiserror::Error;

/// Failures raised by library store operations.
///
/// All of them are local and synchronous; none is fatal to the process.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Identifier '{0}' is not valid")]
    InvalidIdentifier(String),

    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} with name '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("Referenced {kind} '{id}' does not exist")]
    InvalidReference { kind: EntityKind, id: String },

    #[error("{kind} with id {id} does not exist")]
    UnprocessableReference { kind: EntityKind, id: String },

    #[error("{kind} with id {id} is already in favorites")]
    AlreadyFavorited { kind: EntityKind, id: String },

    #[error("{kind} with id {id} is not in favorites")]
    NotFavorited { kind: EntityKind, id: String },

    /// A cascade fixup did not match the state it was planned against.
    /// Nothing was mutated.
    #[error("Cascade delete of {kind} {id} aborted: {reason}")]
    CascadeAborted {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Library lock poisoned")]
    Poisoned,
}

pub type LibraryResult<T> = Result<T, LibraryError>;

impl LibraryError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        LibraryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
