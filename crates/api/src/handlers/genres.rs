//! Handlers for the `/genres` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookshelf_core::types::DbId;
use bookshelf_db::models::genre::{CreateGenre, UpdateGenre};

use crate::error::AppResult;
use crate::extract::{IdPath, IdQuery, JsonBody};
use crate::response::DeletedResponse;
use crate::state::AppState;

/// GET /genres
///
/// All genres, alphabetical by title.
pub async fn list_genres(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let genres = state.genres.list().await?;
    Ok(Json(genres))
}

/// GET /genres/{id}
pub async fn get_genre(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<impl IntoResponse> {
    let genre = state.genres.find_by_id(id).await?;
    Ok(Json(genre))
}

/// POST /genres
pub async fn create_genre(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateGenre>,
) -> AppResult<impl IntoResponse> {
    let genre = state.genres.create(&input).await?;

    tracing::info!(genre_id = genre.id, title = %genre.title, "Genre created");

    Ok((StatusCode::CREATED, Json(genre)))
}

/// PATCH|PUT /genres/{id}
pub async fn update_genre(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<UpdateGenre>,
) -> AppResult<impl IntoResponse> {
    apply_update(&state, id, &input).await
}

/// PATCH|PUT /genres?id={id}
pub async fn update_genre_by_query(
    State(state): State<AppState>,
    IdQuery(id): IdQuery,
    JsonBody(input): JsonBody<UpdateGenre>,
) -> AppResult<impl IntoResponse> {
    apply_update(&state, id, &input).await
}

/// DELETE /genres/{id}
///
/// Refused with 409 while any book still references the genre.
pub async fn delete_genre(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<impl IntoResponse> {
    remove(&state, id).await
}

/// DELETE /genres?id={id}
pub async fn delete_genre_by_query(
    State(state): State<AppState>,
    IdQuery(id): IdQuery,
) -> AppResult<impl IntoResponse> {
    remove(&state, id).await
}

async fn apply_update(
    state: &AppState,
    id: DbId,
    input: &UpdateGenre,
) -> AppResult<impl IntoResponse> {
    let genre = state.genres.update(id, input).await?;

    tracing::info!(genre_id = id, "Genre updated");

    Ok(Json(genre))
}

async fn remove(state: &AppState, id: DbId) -> AppResult<impl IntoResponse> {
    state.genres.delete(id).await?;

    tracing::info!(genre_id = id, "Genre deleted");

    Ok(Json(DeletedResponse::new("Genre", id)))
}
