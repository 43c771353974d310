use axum::routing::get;
use axum::Router;

use crate::handlers::books;
use crate::state::AppState;

/// Book routes mounted at `/books`.
///
/// ```text
/// GET    /              -> list_books
/// POST   /              -> create_book
/// PATCH  /?id={id}      -> update_book_by_query
/// PUT    /?id={id}      -> update_book_by_query
/// DELETE /?id={id}      -> delete_book_by_query
/// GET    /stats         -> book_stats
/// GET    /{id}          -> get_book
/// PATCH  /{id}          -> update_book
/// PUT    /{id}          -> update_book
/// DELETE /{id}          -> delete_book
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(books::list_books)
                .post(books::create_book)
                .patch(books::update_book_by_query)
                .put(books::update_book_by_query)
                .delete(books::delete_book_by_query),
        )
        .route("/stats", get(books::book_stats))
        .route(
            "/{id}",
            get(books::get_book)
                .patch(books::update_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
}
