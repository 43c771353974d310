use std::sync::Arc;

use bookshelf_db::repositories::{BookRepo, BookRepository, GenreRepo, GenreRepository};
use bookshelf_db::DbPool;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` when the repositories are not
    /// backed by PostgreSQL (the in-memory store used by handler tests).
    pub pool: Option<DbPool>,
    /// Book storage.
    pub books: Arc<dyn BookRepository>,
    /// Genre storage.
    pub genres: Arc<dyn GenreRepository>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State backed by the PostgreSQL repositories sharing one pool.
    pub fn new(pool: DbPool, config: ServerConfig) -> Self {
        Self {
            books: Arc::new(BookRepo::new(pool.clone())),
            genres: Arc::new(GenreRepo::new(pool.clone())),
            pool: Some(pool),
            config: Arc::new(config),
        }
    }

    /// State backed by arbitrary repository implementations.
    pub fn with_repositories(
        books: Arc<dyn BookRepository>,
        genres: Arc<dyn GenreRepository>,
        config: ServerConfig,
    ) -> Self {
        Self {
            pool: None,
            books,
            genres,
            config: Arc::new(config),
        }
    }
}
