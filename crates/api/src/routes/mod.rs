pub mod books;
pub mod genres;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the resource route tree.
///
/// Mounted both at the root and under `/api/v1`.
///
/// ```text
/// /books                  list, create; PATCH|PUT|DELETE with ?id=
/// /books/stats            library statistics
/// /books/{id}             get, update, delete
///
/// /genres                 list, create; PATCH|PUT|DELETE with ?id=
/// /genres/{id}            get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/books", books::router())
        .nest("/genres", genres::router())
}
