use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The store rejected a position update for a setlist. The transaction
    /// was rolled back; other setlists are unaffected.
    #[error("Reorder conflict in setlist {setlist_id}: {message}")]
    ReorderConflict { setlist_id: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        LibraryError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Wrap a failed write issued while reordering `setlist_id`.
    ///
    /// Uniqueness violations on `(setlist_id, position)` become
    /// [`LibraryError::ReorderConflict`]; anything else stays a database error.
    pub(crate) fn from_reorder(setlist_id: &str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                LibraryError::ReorderConflict {
                    setlist_id: setlist_id.to_string(),
                    message: db_err.message().to_string(),
                }
            }
            _ => LibraryError::Database(err),
        }
    }

    /// Returns `true` if the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LibraryError::ReorderConflict { .. }
                | LibraryError::Database(sqlx::Error::PoolTimedOut)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
