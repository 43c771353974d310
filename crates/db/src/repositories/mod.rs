//! Repository layer.
//!
//! [`BookRepository`] and [`GenreRepository`] are the interfaces the HTTP
//! layer talks to. [`BookRepo`] and [`GenreRepo`] are the canonical
//! implementations backed by PostgreSQL; each holds a clone of the pool it
//! was constructed with.

use async_trait::async_trait;
use bookshelf_core::stats::LibraryStats;
use bookshelf_core::types::DbId;

use crate::error::RepoResult;
use crate::models::book::{Book, BookFilter, CreateBook, UpdateBook};
use crate::models::genre::{CreateGenre, Genre, UpdateGenre};

pub mod book_repo;
pub mod genre_repo;

pub use book_repo::BookRepo;
pub use genre_repo::GenreRepo;

/// Storage operations for genres.
#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// All genres ordered by title ascending.
    ///
    /// Title comparison follows the store: PostgreSQL uses the database
    /// collation, the in-memory store compares bytes. The two agree under
    /// the `C` collation.
    async fn list(&self) -> RepoResult<Vec<Genre>>;

    /// A single genre, or `NotFound`.
    async fn find_by_id(&self, id: DbId) -> RepoResult<Genre>;

    /// Insert a genre. Blank titles are a validation error, duplicate titles
    /// a conflict.
    async fn create(&self, input: &CreateGenre) -> RepoResult<Genre>;

    /// Overwrite only the supplied fields.
    async fn update(&self, id: DbId, input: &UpdateGenre) -> RepoResult<Genre>;

    /// Remove a genre. Fails with a conflict while any book references it.
    async fn delete(&self, id: DbId) -> RepoResult<()>;
}

/// Storage operations for books and their genre sets.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books ordered by creation time, newest first, with genres populated.
    /// Embedded genres follow the same title ordering as
    /// [`GenreRepository::list`].
    async fn list(&self, filter: &BookFilter) -> RepoResult<Vec<Book>>;

    /// A single book with genres, or `NotFound`.
    async fn get_by_id(&self, id: DbId) -> RepoResult<Book>;

    /// Insert a book and attach its genres. Unknown genre ids are a
    /// validation error and nothing is persisted.
    async fn create(&self, input: &CreateBook) -> RepoResult<Book>;

    /// Overwrite only the supplied fields. A supplied genre list replaces
    /// the existing set.
    async fn update(&self, id: DbId, input: &UpdateBook) -> RepoResult<Book>;

    /// Remove a book and its genre associations.
    async fn delete(&self, id: DbId) -> RepoResult<()>;

    /// Counts per status and pages read across the whole library.
    async fn stats(&self) -> RepoResult<LibraryStats>;
}

/// Format the ids that were requested but not found.
pub(crate) fn missing_genres_message(missing: &[DbId]) -> String {
    let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
    format!("Unknown genre ids: {}", ids.join(", "))
}
