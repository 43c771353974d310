//! Integration tests for the PostgreSQL book repository.
//!
//! Exercises the full repository layer against a real database:
//! - Create with and without genres
//! - Recency ordering and filtering
//! - Partial updates and genre-set replacement
//! - Delete semantics and cascade of genre associations

use assert_matches::assert_matches;
use bookshelf_core::error::CoreError;
use bookshelf_core::input::NumberInput;
use bookshelf_core::status::ReadingStatus;
use bookshelf_db::error::RepoError;
use bookshelf_db::models::book::{BookFilter, CreateBook, UpdateBook};
use bookshelf_db::models::genre::CreateGenre;
use bookshelf_db::repositories::{BookRepo, BookRepository, GenreRepo, GenreRepository};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_book(title: &str, author: &str) -> CreateBook {
    CreateBook {
        title: Some(title.to_string()),
        author: Some(author.to_string()),
        ..Default::default()
    }
}

fn patch(value: serde_json::Value) -> UpdateBook {
    serde_json::from_value(value).unwrap()
}

async fn genre(pool: &PgPool, title: &str) -> i64 {
    GenreRepo::new(pool.clone())
        .create(&CreateGenre {
            title: Some(title.to_string()),
            description: None,
        })
        .await
        .unwrap()
        .id
}

async fn book_genre_rows(pool: &PgPool, book_id: i64) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book_genres WHERE book_id = $1")
        .bind(book_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_populates_id_timestamps_and_genres(pool: PgPool) {
    let fantasy = genre(&pool, "Fantasy").await;
    let repo = BookRepo::new(pool);

    let book = repo
        .create(&CreateBook {
            status: Some("TO_READ".into()),
            genre_ids: Some(vec![fantasy]),
            pages: Some(NumberInput::Text("412".into())),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap();

    assert!(book.id > 0);
    assert_eq!(book.status, ReadingStatus::ToRead);
    assert_eq!(book.pages, Some(412));
    assert_eq!(book.genres.len(), 1);
    assert_eq!(book.genres[0].id, fantasy);
    assert_eq!(book.genres[0].title, "Fantasy");

    let fetched = repo.get_by_id(book.id).await.unwrap();
    assert_eq!(fetched, book);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_without_title_or_author_persists_nothing(pool: PgPool) {
    let repo = BookRepo::new(pool);

    let err = repo.create(&new_book("", "Herbert")).await.unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
    let err = repo.create(&new_book("Dune", " ")).await.unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));

    assert!(repo.list(&BookFilter::default()).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_with_unknown_genre_rolls_back(pool: PgPool) {
    let fantasy = genre(&pool, "Fantasy").await;
    let repo = BookRepo::new(pool);

    let err = repo
        .create(&CreateBook {
            genre_ids: Some(vec![fantasy, 987_654]),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(m)) if m.contains("987654"));

    assert!(repo.list(&BookFilter::default()).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ids_are_unique_and_stable(pool: PgPool) {
    let repo = BookRepo::new(pool);
    let mut ids = Vec::new();
    for i in 0..5 {
        let book = repo.create(&new_book(&format!("Book {i}"), "Author")).await.unwrap();
        ids.push(book.id);
    }

    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    for (i, id) in ids.iter().enumerate() {
        let book = repo.get_by_id(*id).await.unwrap();
        assert_eq!(book.id, *id);
        assert_eq!(book.title, format!("Book {i}"));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_missing_book_is_not_found(pool: PgPool) {
    let repo = BookRepo::new(pool);
    assert_matches!(
        repo.get_by_id(424_242).await,
        Err(RepoError::Core(CoreError::NotFound { entity: "Book", id: 424_242 }))
    );
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_orders_by_created_at_descending(pool: PgPool) {
    let repo = BookRepo::new(pool.clone());
    let a = repo.create(&new_book("A", "X")).await.unwrap();
    let b = repo.create(&new_book("B", "X")).await.unwrap();
    let c = repo.create(&new_book("C", "X")).await.unwrap();

    // Shuffle creation times so insertion order and recency disagree.
    for (id, offset) in [(a.id, "1 hour"), (b.id, "3 hours"), (c.id, "2 hours")] {
        sqlx::query(&format!(
            "UPDATE books SET created_at = NOW() - INTERVAL '{offset}' WHERE id = $1"
        ))
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    }

    let ids: Vec<i64> = repo
        .list(&BookFilter::default())
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec![a.id, c.id, b.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters(pool: PgPool) {
    let scifi = genre(&pool, "Ficção Científica").await;
    let repo = BookRepo::new(pool);

    repo.create(&CreateBook {
        genre_ids: Some(vec![scifi]),
        status: Some("reading".into()),
        ..new_book("Dune", "Frank Herbert")
    })
    .await
    .unwrap();
    repo.create(&new_book("Dom Casmurro", "Machado de Assis"))
        .await
        .unwrap();

    let by_author = BookFilter {
        q: Some("machado".into()),
        ..Default::default()
    };
    let books = repo.list(&by_author).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Dom Casmurro");

    let by_genre_title = BookFilter {
        q: Some("científica".into()),
        ..Default::default()
    };
    assert_eq!(repo.list(&by_genre_title).await.unwrap()[0].title, "Dune");

    let by_status = BookFilter {
        status: Some(ReadingStatus::Reading),
        ..Default::default()
    };
    assert_eq!(repo.list(&by_status).await.unwrap().len(), 1);

    let by_genre = BookFilter {
        genre_id: Some(scifi),
        ..Default::default()
    };
    assert_eq!(repo.list(&by_genre).await.unwrap().len(), 1);

    let wildcard = BookFilter {
        q: Some("%".into()),
        ..Default::default()
    };
    assert!(repo.list(&wildcard).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_update_overwrites_only_supplied_fields(pool: PgPool) {
    let repo = BookRepo::new(pool);
    let book = repo
        .create(&CreateBook {
            notes: Some("loved the worms".into()),
            rating: Some(NumberInput::Int(4)),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap();

    let updated = repo
        .update(book.id, &patch(json!({"currentPage": 50, "notes": null})))
        .await
        .unwrap();

    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.author, "Herbert");
    assert_eq!(updated.rating, Some(4));
    assert_eq!(updated.current_page, Some(50));
    assert_eq!(updated.notes, None);
    assert_eq!(updated.created_at, book.created_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_update_is_rejected_without_mutation(pool: PgPool) {
    let repo = BookRepo::new(pool);
    let book = repo.create(&new_book("Dune", "Herbert")).await.unwrap();

    let err = repo.update(book.id, &patch(json!({}))).await.unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
    assert_eq!(repo.get_by_id(book.id).await.unwrap(), book);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_missing_book_is_not_found(pool: PgPool) {
    let repo = BookRepo::new(pool);
    let err = repo
        .update(31_337, &patch(json!({"title": "Nope"})))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NotFound { entity: "Book", .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn genre_update_replaces_never_merges(pool: PgPool) {
    let a = genre(&pool, "A").await;
    let b = genre(&pool, "B").await;
    let c = genre(&pool, "C").await;
    let repo = BookRepo::new(pool.clone());

    let book = repo
        .create(&CreateBook {
            genre_ids: Some(vec![a, b]),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap();

    let updated = repo
        .update(book.id, &patch(json!({"genreIds": [c, b, c]})))
        .await
        .unwrap();
    let mut ids: Vec<i64> = updated.genres.iter().map(|g| g.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![b, c]);
    assert_eq!(book_genre_rows(&pool, book.id).await, 2);

    let cleared = repo
        .update(book.id, &patch(json!({"genreIds": []})))
        .await
        .unwrap();
    assert!(cleared.genres.is_empty());
    assert_eq!(book_genre_rows(&pool, book.id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_with_unknown_genre_keeps_previous_state(pool: PgPool) {
    let a = genre(&pool, "A").await;
    let repo = BookRepo::new(pool);
    let book = repo
        .create(&CreateBook {
            genre_ids: Some(vec![a]),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap();

    let err = repo
        .update(book.id, &patch(json!({"title": "Changed", "genreIds": [77_777]})))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));

    let unchanged = repo.get_by_id(book.id).await.unwrap();
    assert_eq!(unchanged.title, "Dune");
    assert_eq!(unchanged.genres.len(), 1);
}

// ---------------------------------------------------------------------------
// Delete / stats
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_then_get_is_not_found(pool: PgPool) {
    let a = genre(&pool, "A").await;
    let repo = BookRepo::new(pool.clone());
    let book = repo
        .create(&CreateBook {
            genre_ids: Some(vec![a]),
            ..new_book("Dune", "Herbert")
        })
        .await
        .unwrap();

    repo.delete(book.id).await.unwrap();

    assert_matches!(
        repo.get_by_id(book.id).await,
        Err(RepoError::Core(CoreError::NotFound { .. }))
    );
    assert_matches!(
        repo.delete(book.id).await,
        Err(RepoError::Core(CoreError::NotFound { .. }))
    );
    assert_eq!(book_genre_rows(&pool, book.id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_count_statuses_and_pages(pool: PgPool) {
    let repo = BookRepo::new(pool);
    repo.create(&CreateBook {
        status: Some("READING".into()),
        current_page: Some(NumberInput::Int(120)),
        ..new_book("A", "X")
    })
    .await
    .unwrap();
    repo.create(&CreateBook {
        status: Some("FINISHED".into()),
        total_pages: Some(NumberInput::Int(300)),
        ..new_book("B", "X")
    })
    .await
    .unwrap();
    repo.create(&new_book("C", "X")).await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.reading, 1);
    assert_eq!(stats.finished, 1);
    assert_eq!(stats.to_read, 1);
    assert_eq!(stats.pages_read, 420);
}
