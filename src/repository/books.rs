//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorRef,
        book::{display_genre, Book, BookForm, BookSummary},
        genre::Genre,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn count(&self) -> AppResult<i64>;
    /// Books whose title contains at least one word character
    async fn count_titles_with_word(&self) -> AppResult<i64>;
    /// Page of books in primary-key order
    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookSummary>>;
    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    /// Genres of a book in assignment order
    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>>;
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    async fn create(&self, form: &BookForm) -> AppResult<Book>;
    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book>;
    /// Refused with a conflict while copies of the book exist
    async fn delete(&self, id: i32) -> AppResult<()>;
}

const BOOK_COLUMNS: &str = "id, title, summary, isbn, author_id, language_id";

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, a.first_name, a.last_name, l.name AS language_name,
           ARRAY(
               SELECT g.name::text
               FROM book_genres bg
               JOIN genres g ON g.id = bg.genre_id
               WHERE bg.book_id = b.id
               ORDER BY bg.position
           ) AS genre_names
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
    LEFT JOIN languages l ON l.id = b.language_id
"#;

#[derive(FromRow)]
struct BookSummaryRow {
    id: i32,
    title: String,
    author_id: Option<i32>,
    first_name: Option<String>,
    last_name: Option<String>,
    language_name: Option<String>,
    genre_names: Vec<String>,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        let author = row.author_id.map(|id| AuthorRef {
            id,
            name: format!(
                "{} {}",
                row.first_name.unwrap_or_default(),
                row.last_name.unwrap_or_default()
            ),
        });
        BookSummary {
            id: row.id,
            title: row.title,
            author,
            language: row.language_name,
            display_genre: display_genre(&row.genre_names),
        }
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn set_genres(tx: &mut Transaction<'_, Postgres>, book_id: i32, genre_ids: &[i32]) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        for (position, genre_id) in genre_ids.iter().enumerate() {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(book_id)
                .bind(genre_id)
                .bind(position as i32)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_titles_with_word(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM books WHERE title ~* '\w+'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} ORDER BY b.id LIMIT $1 OFFSET $2", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, BookSummaryRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.id", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, BookSummaryRow>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY bg.position
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE isbn = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO books (title, summary, isbn, author_id, language_id) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&form.title)
            .bind(&form.summary)
            .bind(&form.isbn)
            .bind(form.author)
            .bind(form.language)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("A book with ISBN {} already exists", form.isbn))
                } else {
                    AppError::Database(e)
                }
            })?;

        Self::set_genres(&mut tx, book.id, &form.genre_ids()).await?;
        tx.commit().await?;

        Ok(book)
    }

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "UPDATE books SET title = $1, summary = $2, isbn = $3, author_id = $4, language_id = $5 WHERE id = $6 RETURNING {}",
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&form.title)
            .bind(&form.summary)
            .bind(&form.isbn)
            .bind(form.author)
            .bind(form.language)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("A book with ISBN {} already exists", form.isbn))
                } else {
                    AppError::Database(e)
                }
            })?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Self::set_genres(&mut tx, book.id, &form.genre_ids()).await?;
        tx.commit().await?;

        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!("Book with id {} still has copies", id))
                } else {
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
