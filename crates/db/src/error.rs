//! Error type shared by every repository implementation.

use bookshelf_core::error::CoreError;
use bookshelf_core::types::DbId;

/// PostgreSQL SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for a foreign key violation.
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Failure of a repository operation.
///
/// Domain outcomes (validation, not found, conflict) travel as
/// [`RepoError::Core`]; anything else the store reports stays a raw
/// [`sqlx::Error`] for the HTTP layer to sanitize.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        RepoError::Core(CoreError::NotFound { entity, id })
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        RepoError::Core(CoreError::Validation(msg.into()))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        RepoError::Core(CoreError::Conflict(msg.into()))
    }
}

/// Constraint-aware conversion: integrity violations the schema enforces
/// become domain conflicts, everything else stays a database error.
impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) if constraint == "uq_genres_title" => {
                    return RepoError::conflict("A genre with this title already exists");
                }
                Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => {
                    return RepoError::conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ));
                }
                // The same constraint fires from both sides and PostgreSQL
                // names the referencing table (`book_genres`) either way. Only
                // the message tells a RESTRICT on delete from a bad insert.
                Some(FOREIGN_KEY_VIOLATION) if constraint == "fk_book_genres_genre" => {
                    return if db_err.message().starts_with("update or delete") {
                        RepoError::conflict("Genre is referenced by one or more books")
                    } else {
                        RepoError::validation("Unknown genre ids")
                    };
                }
                _ => {}
            }
        }
        RepoError::Database(err)
    }
}
