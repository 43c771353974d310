//! Genre entity model and DTOs.

use bookshelf_core::error::CoreError;
use bookshelf_core::input::{double_option, optional_text, required_text};
use bookshelf_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `genres` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Lightweight genre info embedded in book payloads.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct GenreSummary {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
}

impl From<&Genre> for GenreSummary {
    fn from(genre: &Genre) -> Self {
        GenreSummary {
            id: genre.id,
            title: genre.title.clone(),
            description: genre.description.clone(),
        }
    }
}

/// DTO for creating a new genre.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGenre {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGenre {
    pub title: String,
    pub description: Option<String>,
}

impl CreateGenre {
    pub fn validate(&self) -> Result<NewGenre, CoreError> {
        Ok(NewGenre {
            title: required_text("title", self.title.as_deref())?,
            description: optional_text(self.description.as_deref()),
        })
    }
}

/// DTO for partially updating a genre.
///
/// `description: null` clears the description; `title` can be changed but
/// never cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGenre {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// An update request that passed validation. `None` means "leave as is".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdateGenre {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> Result<GenreChanges, CoreError> {
        if self.is_empty() {
            return Err(CoreError::validation("No fields to update"));
        }

        let title = match &self.title {
            None => None,
            Some(value) => Some(required_text("title", value.as_deref())?),
        };
        let description = self
            .description
            .as_ref()
            .map(|value| optional_text(value.as_deref()));

        Ok(GenreChanges { title, description })
    }
}
