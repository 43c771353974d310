//! In-memory implementation of the repository traits.
//!
//! Only compiled for tests and behind the `test-support` feature. It applies
//! the same validation and integrity rules as the PostgreSQL repositories so
//! handler tests can run without a database.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bookshelf_core::stats::LibraryStats;
use bookshelf_core::types::{DbId, Timestamp};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{RepoError, RepoResult};
use crate::models::book::{Book, BookChanges, BookFilter, CreateBook, NewBook, UpdateBook};
use crate::models::genre::{CreateGenre, Genre, GenreSummary, UpdateGenre};
use crate::repositories::{missing_genres_message, BookRepository, GenreRepository};

#[derive(Debug, Clone)]
struct BookRecord {
    id: DbId,
    fields: NewBook,
    genre_ids: BTreeSet<DbId>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl BookRecord {
    fn apply(&mut self, changes: &BookChanges, now: Timestamp) {
        let fields = &mut self.fields;
        if let Some(title) = &changes.title {
            fields.title = title.clone();
        }
        if let Some(author) = &changes.author {
            fields.author = author.clone();
        }
        if let Some(status) = changes.status {
            fields.status = status;
        }
        if let Some(pages) = changes.pages {
            fields.pages = pages;
        }
        if let Some(total_pages) = changes.total_pages {
            fields.total_pages = total_pages;
        }
        if let Some(current_page) = changes.current_page {
            fields.current_page = current_page;
        }
        if let Some(rating) = changes.rating {
            fields.rating = rating;
        }
        if let Some(cover_url) = &changes.cover_url {
            fields.cover_url = cover_url.clone();
        }
        if let Some(synopsis) = &changes.synopsis {
            fields.synopsis = synopsis.clone();
        }
        if let Some(isbn) = &changes.isbn {
            fields.isbn = isbn.clone();
        }
        if let Some(notes) = &changes.notes {
            fields.notes = notes.clone();
        }
        if let Some(genre_ids) = &changes.genre_ids {
            self.genre_ids = genre_ids.iter().copied().collect();
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Default)]
struct LibraryState {
    next_book_id: DbId,
    next_genre_id: DbId,
    books: BTreeMap<DbId, BookRecord>,
    genres: BTreeMap<DbId, Genre>,
}

impl LibraryState {
    fn ensure_genres_exist(&self, genre_ids: &[DbId]) -> RepoResult<()> {
        let missing: Vec<DbId> = genre_ids
            .iter()
            .copied()
            .filter(|id| !self.genres.contains_key(id))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RepoError::validation(missing_genres_message(&missing)))
        }
    }

    fn title_taken(&self, title: &str, except: Option<DbId>) -> bool {
        self.genres
            .values()
            .any(|g| g.title == title && Some(g.id) != except)
    }

    fn to_book(&self, record: &BookRecord) -> Book {
        let mut genres: Vec<GenreSummary> = record
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id))
            .map(GenreSummary::from)
            .collect();
        genres.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));

        let fields = record.fields.clone();
        Book {
            id: record.id,
            title: fields.title,
            author: fields.author,
            status: fields.status,
            pages: fields.pages,
            total_pages: fields.total_pages,
            current_page: fields.current_page,
            rating: fields.rating,
            cover_url: fields.cover_url,
            synopsis: fields.synopsis,
            isbn: fields.isbn,
            notes: fields.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
            genres,
        }
    }
}

/// A process-local library holding books and genres behind one lock.
///
/// Ids start at 1 and are never reused, matching `BIGSERIAL` behaviour.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    state: RwLock<LibraryState>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenreRepository for InMemoryLibrary {
    async fn list(&self) -> RepoResult<Vec<Genre>> {
        let state = self.state.read().await;
        let mut genres: Vec<Genre> = state.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn find_by_id(&self, id: DbId) -> RepoResult<Genre> {
        let state = self.state.read().await;
        state
            .genres
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::not_found("Genre", id))
    }

    async fn create(&self, input: &CreateGenre) -> RepoResult<Genre> {
        let genre = input.validate()?;
        let mut state = self.state.write().await;

        if state.title_taken(&genre.title, None) {
            return Err(RepoError::conflict("A genre with this title already exists"));
        }

        state.next_genre_id += 1;
        let now = Utc::now();
        let created = Genre {
            id: state.next_genre_id,
            title: genre.title,
            description: genre.description,
            created_at: now,
            updated_at: now,
        };
        state.genres.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: DbId, input: &UpdateGenre) -> RepoResult<Genre> {
        let changes = input.validate()?;
        let mut state = self.state.write().await;

        if !state.genres.contains_key(&id) {
            return Err(RepoError::not_found("Genre", id));
        }
        if let Some(title) = &changes.title {
            if state.title_taken(title, Some(id)) {
                return Err(RepoError::conflict("A genre with this title already exists"));
            }
        }

        let genre = state
            .genres
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Genre", id))?;
        if let Some(title) = changes.title {
            genre.title = title;
        }
        if let Some(description) = changes.description {
            genre.description = description;
        }
        genre.updated_at = Utc::now();
        Ok(genre.clone())
    }

    async fn delete(&self, id: DbId) -> RepoResult<()> {
        let mut state = self.state.write().await;

        if !state.genres.contains_key(&id) {
            return Err(RepoError::not_found("Genre", id));
        }
        let references = state
            .books
            .values()
            .filter(|b| b.genre_ids.contains(&id))
            .count();
        if references > 0 {
            return Err(RepoError::conflict(format!(
                "Genre {id} is still assigned to {references} book(s)"
            )));
        }

        state.genres.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryLibrary {
    async fn list(&self, filter: &BookFilter) -> RepoResult<Vec<Book>> {
        let state = self.state.read().await;
        let mut records: Vec<&BookRecord> = state.books.values().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .map(|record| state.to_book(record))
            .filter(|book| filter.matches(book))
            .collect())
    }

    async fn get_by_id(&self, id: DbId) -> RepoResult<Book> {
        let state = self.state.read().await;
        state
            .books
            .get(&id)
            .map(|record| state.to_book(record))
            .ok_or_else(|| RepoError::not_found("Book", id))
    }

    async fn create(&self, input: &CreateBook) -> RepoResult<Book> {
        let fields = input.validate()?;
        let mut state = self.state.write().await;

        state.ensure_genres_exist(&fields.genre_ids)?;

        state.next_book_id += 1;
        let now = Utc::now();
        let record = BookRecord {
            id: state.next_book_id,
            genre_ids: fields.genre_ids.iter().copied().collect(),
            fields,
            created_at: now,
            updated_at: now,
        };
        let book = state.to_book(&record);
        state.books.insert(record.id, record);
        Ok(book)
    }

    async fn update(&self, id: DbId, input: &UpdateBook) -> RepoResult<Book> {
        let changes = input.validate()?;
        let mut state = self.state.write().await;

        if !state.books.contains_key(&id) {
            return Err(RepoError::not_found("Book", id));
        }
        if let Some(genre_ids) = &changes.genre_ids {
            state.ensure_genres_exist(genre_ids)?;
        }

        let record = state
            .books
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found("Book", id))?;
        record.apply(&changes, Utc::now());
        let record = record.clone();
        Ok(state.to_book(&record))
    }

    async fn delete(&self, id: DbId) -> RepoResult<()> {
        let mut state = self.state.write().await;
        state
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepoError::not_found("Book", id))
    }

    async fn stats(&self) -> RepoResult<LibraryStats> {
        let state = self.state.read().await;
        Ok(LibraryStats::from_entries(
            state.books.values().map(|record| state.to_book(record).progress()),
        ))
    }
}
