//! Repository for the `books` and `book_genres` tables.
//!
//! Multi-statement writes (a book plus its genre set) run inside one
//! transaction so a failed genre check leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use bookshelf_core::stats::{LibraryStats, ProgressEntry};
use bookshelf_core::status::ReadingStatus;
use bookshelf_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool};

use crate::error::{RepoError, RepoResult};
use crate::models::book::{Book, BookFilter, BookRow, CreateBook, UpdateBook};
use crate::models::genre::GenreSummary;
use crate::repositories::{missing_genres_message, BookRepository};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, title, author, status, pages, total_pages, current_page, rating, \
    cover_url, synopsis, isbn, notes, created_at, updated_at";

/// PostgreSQL-backed book storage.
#[derive(Debug, Clone)]
pub struct BookRepo {
    pool: PgPool,
}

impl BookRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One genre attached to one book, as loaded for a batch of books.
#[derive(Debug, FromRow)]
struct BookGenreRow {
    book_id: DbId,
    id: DbId,
    title: String,
    description: Option<String>,
}

/// Load the genres of every book in `book_ids`, grouped by book id and
/// ordered by genre title.
async fn load_genres<'e, E>(
    executor: E,
    book_ids: &[DbId],
) -> Result<HashMap<DbId, Vec<GenreSummary>>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, BookGenreRow>(
        "SELECT bg.book_id, g.id, g.title, g.description
         FROM book_genres bg
         JOIN genres g ON g.id = bg.genre_id
         WHERE bg.book_id = ANY($1)
         ORDER BY g.title ASC, g.id ASC",
    )
    .bind(book_ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<DbId, Vec<GenreSummary>> = HashMap::new();
    for row in rows {
        grouped.entry(row.book_id).or_default().push(GenreSummary {
            id: row.id,
            title: row.title,
            description: row.description,
        });
    }
    Ok(grouped)
}

/// Fail with a validation error naming every id in `genre_ids` that has no
/// matching genre.
async fn ensure_genres_exist<'e, E>(executor: E, genre_ids: &[DbId]) -> RepoResult<()>
where
    E: PgExecutor<'e>,
{
    if genre_ids.is_empty() {
        return Ok(());
    }

    let found: Vec<(DbId,)> = sqlx::query_as("SELECT id FROM genres WHERE id = ANY($1)")
        .bind(genre_ids)
        .fetch_all(executor)
        .await?;

    let missing: Vec<DbId> = genre_ids
        .iter()
        .copied()
        .filter(|id| !found.iter().any(|(found_id,)| found_id == id))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RepoError::validation(missing_genres_message(&missing)))
    }
}

/// Attach `genre_ids` to a book. The caller guarantees the ids are unique.
async fn insert_book_genres<'e, E>(
    executor: E,
    book_id: DbId,
    genre_ids: &[DbId],
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if genre_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO book_genres (book_id, genre_id)
         SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(book_id)
    .bind(genre_ids)
    .execute(executor)
    .await?;
    Ok(())
}

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn into_book(row: BookRow, genres: &mut HashMap<DbId, Vec<GenreSummary>>) -> RepoResult<Book> {
    let book_genres = genres.remove(&row.id).unwrap_or_default();
    Ok(Book::from_row(row, book_genres)?)
}

#[async_trait]
impl BookRepository for BookRepo {
    async fn list(&self, filter: &BookFilter) -> RepoResult<Vec<Book>> {
        let pattern = filter.search_term().map(|term| like_pattern(&term));

        let query = format!(
            "SELECT {COLUMNS} FROM books
             WHERE ($1::TEXT IS NULL
                    OR title ILIKE $1
                    OR author ILIKE $1
                    OR EXISTS (
                        SELECT 1 FROM book_genres bg
                        JOIN genres g ON g.id = bg.genre_id
                        WHERE bg.book_id = books.id AND g.title ILIKE $1))
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::BIGINT IS NULL OR EXISTS (
                        SELECT 1 FROM book_genres bg
                        WHERE bg.book_id = books.id AND bg.genre_id = $3))
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, BookRow>(&query)
            .bind(pattern)
            .bind(filter.status.map(ReadingStatus::as_str))
            .bind(filter.genre_id)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let mut genres = load_genres(&self.pool, &ids).await?;

        rows.into_iter()
            .map(|row| into_book(row, &mut genres))
            .collect()
    }

    async fn get_by_id(&self, id: DbId) -> RepoResult<Book> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::not_found("Book", id))?;

        let mut genres = load_genres(&self.pool, &[id]).await?;
        into_book(row, &mut genres)
    }

    async fn create(&self, input: &CreateBook) -> RepoResult<Book> {
        let book = input.validate()?;

        let mut tx = self.pool.begin().await?;

        ensure_genres_exist(&mut *tx, &book.genre_ids).await?;

        let query = format!(
            "INSERT INTO books
                (title, author, status, pages, total_pages, current_page, rating,
                 cover_url, synopsis, isbn, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.status.as_str())
            .bind(book.pages)
            .bind(book.total_pages)
            .bind(book.current_page)
            .bind(book.rating)
            .bind(&book.cover_url)
            .bind(&book.synopsis)
            .bind(&book.isbn)
            .bind(&book.notes)
            .fetch_one(&mut *tx)
            .await?;

        insert_book_genres(&mut *tx, row.id, &book.genre_ids).await?;
        let mut genres = load_genres(&mut *tx, &[row.id]).await?;

        tx.commit().await?;

        tracing::debug!(book_id = row.id, genres = book.genre_ids.len(), "Book inserted");
        into_book(row, &mut genres)
    }

    async fn update(&self, id: DbId, input: &UpdateBook) -> RepoResult<Book> {
        let changes = input.validate()?;

        let mut tx = self.pool.begin().await?;

        // Nullable columns: the flag says "supplied", the value may be NULL
        // to clear. Required columns use COALESCE since they cannot be cleared.
        let query = format!(
            "UPDATE books SET
                title        = COALESCE($2, title),
                author       = COALESCE($3, author),
                status       = COALESCE($4, status),
                pages        = CASE WHEN $5 THEN $6 ELSE pages END,
                total_pages  = CASE WHEN $7 THEN $8 ELSE total_pages END,
                current_page = CASE WHEN $9 THEN $10 ELSE current_page END,
                rating       = CASE WHEN $11 THEN $12 ELSE rating END,
                cover_url    = CASE WHEN $13 THEN $14 ELSE cover_url END,
                synopsis     = CASE WHEN $15 THEN $16 ELSE synopsis END,
                isbn         = CASE WHEN $17 THEN $18 ELSE isbn END,
                notes        = CASE WHEN $19 THEN $20 ELSE notes END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.author)
            .bind(changes.status.map(ReadingStatus::as_str))
            .bind(changes.pages.is_some())
            .bind(changes.pages.flatten())
            .bind(changes.total_pages.is_some())
            .bind(changes.total_pages.flatten())
            .bind(changes.current_page.is_some())
            .bind(changes.current_page.flatten())
            .bind(changes.rating.is_some())
            .bind(changes.rating.flatten())
            .bind(changes.cover_url.is_some())
            .bind(changes.cover_url.clone().flatten())
            .bind(changes.synopsis.is_some())
            .bind(changes.synopsis.clone().flatten())
            .bind(changes.isbn.is_some())
            .bind(changes.isbn.clone().flatten())
            .bind(changes.notes.is_some())
            .bind(changes.notes.clone().flatten())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::not_found("Book", id))?;

        if let Some(genre_ids) = &changes.genre_ids {
            ensure_genres_exist(&mut *tx, genre_ids).await?;
            sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_book_genres(&mut *tx, id, genre_ids).await?;
        }

        let mut genres = load_genres(&mut *tx, &[id]).await?;

        tx.commit().await?;

        tracing::debug!(
            book_id = id,
            genres_replaced = changes.genre_ids.is_some(),
            "Book updated"
        );
        into_book(row, &mut genres)
    }

    async fn delete(&self, id: DbId) -> RepoResult<()> {
        // book_genres rows go with the book via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Book", id));
        }
        Ok(())
    }

    async fn stats(&self) -> RepoResult<LibraryStats> {
        let rows: Vec<(String, Option<i32>, Option<i32>, Option<i32>)> =
            sqlx::query_as("SELECT status, pages, total_pages, current_page FROM books")
                .fetch_all(&self.pool)
                .await?;

        let entries = rows
            .into_iter()
            .map(|(status, pages, total_pages, current_page)| {
                Ok(ProgressEntry {
                    status: ReadingStatus::parse(&status)?,
                    pages,
                    total_pages,
                    current_page,
                })
            })
            .collect::<Result<Vec<_>, bookshelf_core::error::CoreError>>()?;

        Ok(LibraryStats::from_entries(entries))
    }
}
