//! Book entity model and DTOs.

use bookshelf_core::error::CoreError;
use bookshelf_core::input::{
    coerce_count, coerce_rating, dedup_ids, double_option, normalize_isbn, optional_text,
    required_text, IsbnInput, NumberInput,
};
use bookshelf_core::stats::ProgressEntry;
use bookshelf_core::status::ReadingStatus;
use bookshelf_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::models::genre::GenreSummary;

/// A row from the `books` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: DbId,
    pub title: String,
    pub author: String,
    pub status: String,
    pub pages: Option<i32>,
    pub total_pages: Option<i32>,
    pub current_page: Option<i32>,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
    pub synopsis: Option<String>,
    pub isbn: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A book with its genres, as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: DbId,
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    pub pages: Option<i32>,
    pub total_pages: Option<i32>,
    pub current_page: Option<i32>,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
    pub synopsis: Option<String>,
    pub isbn: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub genres: Vec<GenreSummary>,
}

impl Book {
    /// Combine a database row with its genres.
    ///
    /// The `status` column is constrained by a CHECK, so an unparseable
    /// value means the schema and the code disagree.
    pub fn from_row(row: BookRow, genres: Vec<GenreSummary>) -> Result<Self, CoreError> {
        let status = ReadingStatus::parse(&row.status).map_err(|_| {
            CoreError::Internal(format!("book {} has unknown status '{}'", row.id, row.status))
        })?;

        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            status,
            pages: row.pages,
            total_pages: row.total_pages,
            current_page: row.current_page,
            rating: row.rating,
            cover_url: row.cover_url,
            synopsis: row.synopsis,
            isbn: row.isbn,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            genres,
        })
    }

    pub fn progress(&self) -> ProgressEntry {
        ProgressEntry {
            status: self.status,
            pages: self.pages,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

/// A genre reference in a book payload: either a bare id or `{ "id": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GenreRef {
    Id(DbId),
    Object { id: DbId },
}

impl GenreRef {
    pub fn id(self) -> DbId {
        match self {
            GenreRef::Id(id) | GenreRef::Object { id } => id,
        }
    }
}

/// Merge `genreIds` with the older `genres: [{ id }]` form.
fn collect_genre_ids(genre_ids: Option<&[DbId]>, genres: Option<&[GenreRef]>) -> Option<Vec<DbId>> {
    if genre_ids.is_none() && genres.is_none() {
        return None;
    }
    let mut ids: Vec<DbId> = genre_ids.unwrap_or_default().to_vec();
    ids.extend(genres.unwrap_or_default().iter().map(|g| g.id()));
    Some(dedup_ids(&ids))
}

/// DTO for creating a new book.
///
/// Required fields are `Option` here so that a missing key surfaces as a
/// validation message rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Defaults to `TO_READ` when omitted or blank.
    pub status: Option<String>,
    pub pages: Option<NumberInput>,
    pub total_pages: Option<NumberInput>,
    pub current_page: Option<NumberInput>,
    pub rating: Option<NumberInput>,
    pub cover_url: Option<String>,
    pub synopsis: Option<String>,
    pub isbn: Option<IsbnInput>,
    pub notes: Option<String>,
    pub genre_ids: Option<Vec<DbId>>,
    pub genres: Option<Vec<GenreRef>>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    pub pages: Option<i32>,
    pub total_pages: Option<i32>,
    pub current_page: Option<i32>,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
    pub synopsis: Option<String>,
    pub isbn: Option<String>,
    pub notes: Option<String>,
    /// Sorted, without duplicates.
    pub genre_ids: Vec<DbId>,
}

impl CreateBook {
    pub fn validate(&self) -> Result<NewBook, CoreError> {
        let title = required_text("title", self.title.as_deref())?;
        let author = required_text("author", self.author.as_deref())?;
        let status = match optional_text(self.status.as_deref()) {
            Some(raw) => ReadingStatus::parse(&raw)?,
            None => ReadingStatus::default(),
        };

        Ok(NewBook {
            title,
            author,
            status,
            pages: coerce_count("pages", self.pages.as_ref())?,
            total_pages: coerce_count("totalPages", self.total_pages.as_ref())?,
            current_page: coerce_count("currentPage", self.current_page.as_ref())?,
            rating: coerce_rating(self.rating.as_ref())?,
            cover_url: optional_text(self.cover_url.as_deref()),
            synopsis: optional_text(self.synopsis.as_deref()),
            isbn: normalize_isbn(self.isbn.as_ref()),
            notes: optional_text(self.notes.as_deref()),
            genre_ids: collect_genre_ids(self.genre_ids.as_deref(), self.genres.as_deref())
                .unwrap_or_default(),
        })
    }
}

/// DTO for partially updating a book.
///
/// Every field distinguishes "omitted" (`None`) from an explicit `null`
/// (`Some(None)`). Unknown keys such as `id` or `createdAt` are ignored so
/// clients can send back a full book object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pages: Option<Option<NumberInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_pages: Option<Option<NumberInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub current_page: Option<Option<NumberInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<NumberInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cover_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub synopsis: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub isbn: Option<Option<IsbnInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    /// `null` or `[]` clears the genre set.
    #[serde(default, deserialize_with = "double_option")]
    pub genre_ids: Option<Option<Vec<DbId>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub genres: Option<Option<Vec<GenreRef>>>,
}

/// An update request that passed validation. Outer `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<ReadingStatus>,
    pub pages: Option<Option<i32>>,
    pub total_pages: Option<Option<i32>>,
    pub current_page: Option<Option<i32>>,
    pub rating: Option<Option<i32>>,
    pub cover_url: Option<Option<String>>,
    pub synopsis: Option<Option<String>>,
    pub isbn: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    /// Replacement genre set, sorted and without duplicates.
    pub genre_ids: Option<Vec<DbId>>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.status.is_none()
            && self.pages.is_none()
            && self.total_pages.is_none()
            && self.current_page.is_none()
            && self.rating.is_none()
            && self.cover_url.is_none()
            && self.synopsis.is_none()
            && self.isbn.is_none()
            && self.notes.is_none()
            && self.genre_ids.is_none()
            && self.genres.is_none()
    }

    pub fn validate(&self) -> Result<BookChanges, CoreError> {
        if self.is_empty() {
            return Err(CoreError::validation("No fields to update"));
        }

        let title = match &self.title {
            None => None,
            Some(value) => Some(required_text("title", value.as_deref())?),
        };
        let author = match &self.author {
            None => None,
            Some(value) => Some(required_text("author", value.as_deref())?),
        };
        let status = match &self.status {
            None => None,
            Some(None) => return Err(CoreError::validation("status cannot be cleared")),
            Some(Some(raw)) => Some(ReadingStatus::parse(raw)?),
        };

        let genre_ids = match (&self.genre_ids, &self.genres) {
            (None, None) => None,
            (ids, genres) => Some(
                collect_genre_ids(
                    ids.as_ref().and_then(|v| v.as_deref()),
                    genres.as_ref().and_then(|v| v.as_deref()),
                )
                .unwrap_or_default(),
            ),
        };

        Ok(BookChanges {
            title,
            author,
            status,
            pages: patch_count("pages", &self.pages)?,
            total_pages: patch_count("totalPages", &self.total_pages)?,
            current_page: patch_count("currentPage", &self.current_page)?,
            rating: match &self.rating {
                None => None,
                Some(value) => Some(coerce_rating(value.as_ref())?),
            },
            cover_url: patch_text(&self.cover_url),
            synopsis: patch_text(&self.synopsis),
            isbn: self
                .isbn
                .as_ref()
                .map(|value| normalize_isbn(value.as_ref())),
            notes: patch_text(&self.notes),
            genre_ids,
        })
    }
}

fn patch_count(
    field: &str,
    value: &Option<Option<NumberInput>>,
) -> Result<Option<Option<i32>>, CoreError> {
    match value {
        None => Ok(None),
        Some(inner) => coerce_count(field, inner.as_ref()).map(Some),
    }
}

fn patch_text(value: &Option<Option<String>>) -> Option<Option<String>> {
    value.as_ref().map(|inner| optional_text(inner.as_deref()))
}

/// Query parameters for `GET /books`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilter {
    /// Case-insensitive match on title, author or genre title.
    pub q: Option<String>,
    /// A blank value (`?status=`) means "any status".
    #[serde(default, deserialize_with = "blank_status_as_none")]
    pub status: Option<ReadingStatus>,
    pub genre_id: Option<DbId>,
}

fn blank_status_as_none<'de, D>(deserializer: D) -> Result<Option<ReadingStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    optional_text(raw.as_deref())
        .map(|value| ReadingStatus::parse(&value).map_err(serde::de::Error::custom))
        .transpose()
}

impl BookFilter {
    /// The trimmed search term, if any.
    pub fn search_term(&self) -> Option<String> {
        optional_text(self.q.as_deref())
    }

    /// Whether `book` passes every supplied criterion.
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(status) = self.status {
            if book.status != status {
                return false;
            }
        }
        if let Some(genre_id) = self.genre_id {
            if !book.genres.iter().any(|g| g.id == genre_id) {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
                    || book
                        .genres
                        .iter()
                        .any(|g| g.title.to_lowercase().contains(&term))
            }
        }
    }
}
