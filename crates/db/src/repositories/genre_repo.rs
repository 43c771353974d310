//! Repository for the `genres` table.

use async_trait::async_trait;
use bookshelf_core::types::DbId;
use sqlx::PgPool;

use crate::error::{RepoError, RepoResult, FOREIGN_KEY_VIOLATION};
use crate::models::genre::{CreateGenre, Genre, UpdateGenre};
use crate::repositories::GenreRepository;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, created_at, updated_at";

/// PostgreSQL-backed genre storage.
#[derive(Debug, Clone)]
pub struct GenreRepo {
    pool: PgPool,
}

impl GenreRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreRepository for GenreRepo {
    async fn list(&self) -> RepoResult<Vec<Genre>> {
        let query = format!("SELECT {COLUMNS} FROM genres ORDER BY title ASC, id ASC");
        let genres = sqlx::query_as::<_, Genre>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn find_by_id(&self, id: DbId) -> RepoResult<Genre> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::not_found("Genre", id))
    }

    async fn create(&self, input: &CreateGenre) -> RepoResult<Genre> {
        let genre = input.validate()?;

        let query = format!(
            "INSERT INTO genres (title, description)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Genre>(&query)
            .bind(&genre.title)
            .bind(&genre.description)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(genre_id = created.id, "Genre inserted");
        Ok(created)
    }

    async fn update(&self, id: DbId, input: &UpdateGenre) -> RepoResult<Genre> {
        let changes = input.validate()?;

        // description: outer Some means "supplied", inner None clears it.
        let description_provided = changes.description.is_some();
        let description_value = changes.description.as_ref().and_then(|v| v.as_deref());

        let query = format!(
            "UPDATE genres SET
                title       = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(description_provided)
            .bind(description_value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::not_found("Genre", id))
    }

    async fn delete(&self, id: DbId) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(DbId,)> = sqlx::query_as("SELECT id FROM genres WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepoError::not_found("Genre", id));
        }

        let (references,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM book_genres WHERE genre_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if references > 0 {
            return Err(RepoError::conflict(format!(
                "Genre {id} is still assigned to {references} book(s)"
            )));
        }

        // The RESTRICT foreign key still guards against a book picking the
        // genre up between the count and the delete.
        sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err)
                    if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
                {
                    RepoError::conflict(format!("Genre {id} is still assigned to a book"))
                }
                _ => RepoError::from(err),
            })?;

        tx.commit().await?;
        Ok(())
    }
}
