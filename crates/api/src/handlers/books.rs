//! Handlers for the `/books` resource.
//!
//! Every handler goes through [`AppState::books`], so the same code serves
//! the PostgreSQL repository in production and the in-memory store in tests.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bookshelf_core::types::DbId;
use bookshelf_db::models::book::{BookFilter, CreateBook, UpdateBook};

use crate::error::AppResult;
use crate::extract::{IdPath, IdQuery, JsonBody, QueryParams};
use crate::response::DeletedResponse;
use crate::state::AppState;

/// GET /books
///
/// List books newest first. Optional `q` (title, author or genre title),
/// `status` and `genreId` narrow the result.
pub async fn list_books(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<BookFilter>,
) -> AppResult<impl IntoResponse> {
    let books = state.books.list(&filter).await?;
    Ok(Json(books))
}

/// GET /books/stats
pub async fn book_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.books.stats().await?;
    Ok(Json(stats))
}

/// GET /books/{id}
pub async fn get_book(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<impl IntoResponse> {
    let book = state.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// POST /books
///
/// Create a book together with its genre set. Returns 201 with the stored
/// book, genres populated.
pub async fn create_book(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateBook>,
) -> AppResult<impl IntoResponse> {
    let book = state.books.create(&input).await?;

    tracing::info!(book_id = book.id, genres = book.genres.len(), "Book created");

    Ok((StatusCode::CREATED, Json(book)))
}

/// PATCH|PUT /books/{id}
pub async fn update_book(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<UpdateBook>,
) -> AppResult<impl IntoResponse> {
    apply_update(&state, id, &input).await
}

/// PATCH|PUT /books?id={id}
pub async fn update_book_by_query(
    State(state): State<AppState>,
    IdQuery(id): IdQuery,
    JsonBody(input): JsonBody<UpdateBook>,
) -> AppResult<impl IntoResponse> {
    apply_update(&state, id, &input).await
}

/// DELETE /books/{id}
pub async fn delete_book(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<impl IntoResponse> {
    remove(&state, id).await
}

/// DELETE /books?id={id}
pub async fn delete_book_by_query(
    State(state): State<AppState>,
    IdQuery(id): IdQuery,
) -> AppResult<impl IntoResponse> {
    remove(&state, id).await
}

async fn apply_update(
    state: &AppState,
    id: DbId,
    input: &UpdateBook,
) -> AppResult<impl IntoResponse> {
    let book = state.books.update(id, input).await?;

    tracing::info!(
        book_id = id,
        genres_replaced = input.genre_ids.is_some() || input.genres.is_some(),
        "Book updated"
    );

    Ok(Json(book))
}

async fn remove(state: &AppState, id: DbId) -> AppResult<impl IntoResponse> {
    state.books.delete(id).await?;

    tracing::info!(book_id = id, "Book deleted");

    Ok(Json(DeletedResponse::new("Book", id)))
}
