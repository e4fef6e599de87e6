//! Repository and service tests on a throwaway PostgreSQL database
//!
//! `#[sqlx::test]` creates a fresh database per test from `DATABASE_URL`
//! and applies the migrations.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;

use catalog_server::{
    error::AppError,
    models::{AuthorForm, BookForm, CopyForm, LoanStatus},
    repository::Repository,
    services::{
        sessions::{SessionData, SessionStore},
        Services,
    },
    AppResult,
};

/// Sessions are not exercised here
struct NoSessions;

#[async_trait::async_trait]
impl SessionStore for NoSessions {
    async fn load(&self, _token: &str) -> AppResult<Option<SessionData>> {
        Ok(None)
    }

    async fn save(&self, _token: &str, _data: &SessionData) -> AppResult<()> {
        Ok(())
    }

    async fn destroy(&self, _token: &str) -> AppResult<()> {
        Ok(())
    }
}

fn setup(pool: PgPool) -> (Repository, Services) {
    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), Arc::new(NoSessions));
    (repository, services)
}

fn author_form(first: &str, last: &str) -> AuthorForm {
    AuthorForm {
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..Default::default()
    }
}

fn book_form(isbn: &str, author: Option<i32>) -> BookForm {
    BookForm {
        title: "Book Title".to_string(),
        summary: "My book summary".to_string(),
        isbn: isbn.to_string(),
        author,
        ..Default::default()
    }
}

#[sqlx::test]
#[ignore] // Run with: cargo test -- --ignored
async fn deleting_an_author_keeps_their_books(pool: PgPool) {
    let (repository, services) = setup(pool);

    let author = repository.authors.create(&author_form("John", "Smith")).await.unwrap();
    let book = repository.books.create(&book_form("ABCDEFG", Some(author.id))).await.unwrap();

    services.catalog.delete_author(author.id).await.unwrap();

    let book = repository.books.get_by_id(book.id).await.unwrap();
    assert_eq!(book.author_id, None);
    assert!(matches!(
        repository.authors.get_by_id(author.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test]
#[ignore]
async fn thirteen_authors_paginate_ten_and_three(pool: PgPool) {
    let (repository, services) = setup(pool);

    for n in 0..13 {
        repository
            .authors
            .create(&author_form(&format!("Christian {}", n), &format!("Surname {}", n)))
            .await
            .unwrap();
    }

    let first = services.catalog.list_authors(None).await.unwrap();
    assert!(first.is_paginated);
    assert_eq!(first.object_list.len(), 10);

    let second = services.catalog.list_authors(Some("2")).await.unwrap();
    assert_eq!(second.object_list.len(), 3);

    assert!(matches!(
        services.catalog.list_authors(Some("3")).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test]
#[ignore]
async fn borrowed_list_is_ordered_by_due_date(pool: PgPool) {
    let (repository, services) = setup(pool);
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let borrower = repository.users.create("testuser1", "unused-hash").await.unwrap();
    let book = repository.books.create(&book_form("ABCDEFG", None)).await.unwrap();

    // Alternate statuses; only "on loan" copies are listed
    for n in 0..30i64 {
        let status = if n % 5 == 0 { LoanStatus::Available } else { LoanStatus::OnLoan };
        let form = CopyForm {
            imprint: "Unlikely Imprint, 2016".to_string(),
            status,
            due_back: Some(today + Duration::days((n * 7) % 11)),
            borrower: Some(borrower.id),
        };
        repository.book_instances.create(book.id, &form).await.unwrap();
    }

    let page = services.loans.all_borrowed(None, today).await.unwrap();
    assert_eq!(page.count, 24);
    assert_eq!(page.object_list.len(), 10);
    assert!(page
        .object_list
        .windows(2)
        .all(|pair| pair[0].due_back <= pair[1].due_back));
    assert!(page.object_list.iter().all(|copy| copy.status == LoanStatus::OnLoan));

    let mine = services.loans.my_borrowed(borrower.id, Some("last"), today).await.unwrap();
    assert_eq!(mine.object_list.len(), 4);
}

#[sqlx::test]
#[ignore]
async fn my_books_is_empty_for_a_new_user(pool: PgPool) {
    let (repository, services) = setup(pool);
    let user = repository.users.create("testuser2", "unused-hash").await.unwrap();

    let page = services
        .loans
        .my_borrowed(user.id, None, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        .await
        .unwrap();
    assert!(page.object_list.is_empty());
    assert_eq!(page.num_pages, 1);
}

#[sqlx::test]
#[ignore]
async fn book_with_copies_cannot_be_deleted(pool: PgPool) {
    let (repository, services) = setup(pool);
    let book = repository.books.create(&book_form("ABCDEFG", None)).await.unwrap();
    let form = CopyForm {
        imprint: "Imprint".to_string(),
        ..Default::default()
    };
    repository.book_instances.create(book.id, &form).await.unwrap();

    assert!(matches!(
        services.catalog.delete_book(book.id).await,
        Err(AppError::Conflict(_))
    ));
}

#[sqlx::test]
#[ignore]
async fn genres_keep_assignment_order(pool: PgPool) {
    let (repository, services) = setup(pool);
    let second = repository.genres.create("Фантастика2").await.unwrap();
    let first = repository.genres.create("Фантастика1").await.unwrap();

    let form = BookForm {
        genre: vec![first.id, second.id],
        ..book_form("12345", None)
    };
    services.catalog.create_book(&form).await.unwrap().unwrap();

    let books = services.catalog.list_books(None).await.unwrap();
    assert_eq!(books.object_list[0].display_genre, "Фантастика1, Фантастика2");

    let counts = services.catalog.counts().await.unwrap();
    assert_eq!(counts.num_genres, 2);
    assert_eq!(counts.num_books, 1);
}
