//! End-to-end walk through the book lifecycle over HTTP.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, patch_json, post_json};
use serde_json::json;

#[tokio::test]
async fn genre_book_lifecycle() {
    let app = common::build_test_app();

    // Create the genre.
    let response = post_json(&app, "/genres", json!({"title": "Fantasy"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let genre = body_json(response).await;
    assert_eq!(genre["id"], 1);
    assert_eq!(genre["title"], "Fantasy");

    // Create the book attached to it.
    let response = post_json(
        &app,
        "/books",
        json!({"title": "Dune", "author": "Frank Herbert", "genreIds": [1]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let book_id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["status"], "TO_READ");
    assert_eq!(created["genres"].as_array().unwrap().len(), 1);
    assert_eq!(created["genres"][0]["id"], 1);
    assert_eq!(created["genres"][0]["title"], "Fantasy");

    // Read it back: same payload.
    let response = get(&app, &format!("/books/{book_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);

    // Partial update leaves everything else alone.
    let response = patch_json(&app, &format!("/books/{book_id}"), json!({"currentPage": 50})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["currentPage"], 50);
    assert_eq!(updated["title"], "Dune");
    assert_eq!(updated["author"], "Frank Herbert");
    assert_eq!(updated["genres"], created["genres"]);

    // Delete, then it is gone.
    let response = delete(&app, &format!("/books/{book_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = body_json(response).await;
    assert_eq!(deleted["id"], book_id);
    assert_eq!(deleted["message"], "Book deleted");

    let response = get(&app, &format!("/books/{book_id}")).await;
    common::expect_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    // With no book referencing it the genre can now go too.
    let response = delete(&app, "/genres/1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn same_lifecycle_under_api_v1_prefix() {
    let app = common::build_test_app();

    let genre_id = common::create_genre(&app, "Fantasy").await;
    let response = post_json(
        &app,
        "/api/v1/books",
        json!({"title": "Dune", "author": "Frank Herbert", "genreIds": [genre_id]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let book_id = body_json(response).await["id"].as_i64().unwrap();

    // Root and prefixed routes share one store.
    let response = get(&app, &format!("/books/{book_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete(&app, &format!("/api/v1/books/{book_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = get(&app, &format!("/api/v1/books/{book_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
