use axum::routing::get;
use axum::Router;

use crate::handlers::genres;
use crate::state::AppState;

/// Genre routes mounted at `/genres`.
///
/// ```text
/// GET    /              -> list_genres
/// POST   /              -> create_genre
/// PATCH  /?id={id}      -> update_genre_by_query
/// PUT    /?id={id}      -> update_genre_by_query
/// DELETE /?id={id}      -> delete_genre_by_query
/// GET    /{id}          -> get_genre
/// PATCH  /{id}          -> update_genre
/// PUT    /{id}          -> update_genre
/// DELETE /{id}          -> delete_genre
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(genres::list_genres)
                .post(genres::create_genre)
                .patch(genres::update_genre_by_query)
                .put(genres::update_genre_by_query)
                .delete(genres::delete_genre_by_query),
        )
        .route(
            "/{id}",
            get(genres::get_genre)
                .patch(genres::update_genre)
                .put(genres::update_genre)
                .delete(genres::delete_genre),
        )
}
