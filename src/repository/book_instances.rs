//! Book copies repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceRow, CopyForm, LoanStatus},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    async fn count(&self) -> AppResult<i64>;
    async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64>;
    /// On-loan copies, optionally restricted to one borrower
    async fn count_on_loan(&self, borrower_id: Option<i32>) -> AppResult<i64>;
    /// Page of on-loan copies ordered by due date
    async fn list_on_loan(&self, borrower_id: Option<i32>, limit: i64, offset: i64) -> AppResult<Vec<BookInstanceRow>>;
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceRow>;
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
    async fn create(&self, book_id: i32, form: &CopyForm) -> AppResult<BookInstance>;
    async fn update(&self, id: Uuid, form: &CopyForm) -> AppResult<BookInstance>;
}

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, status, borrower_id";

const ROW_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back, bi.status,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_on_loan(&self, borrower_id: Option<i32>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)",
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_on_loan(&self, borrower_id: Option<i32>, limit: i64, offset: i64) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!(
            "{} WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2) \
             ORDER BY bi.due_back ASC NULLS LAST, bi.id LIMIT $3 OFFSET $4",
            ROW_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "SELECT {} FROM book_instances WHERE book_id = $1 ORDER BY due_back ASC NULLS LAST, id",
            INSTANCE_COLUMNS
        );
        let copies = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(copies)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceRow> {
        let query = format!("{} WHERE bi.id = $1", ROW_SELECT);
        sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book copy {} not found", id)))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book copy {} not found", id)));
        }
        Ok(())
    }

    async fn create(&self, book_id: i32, form: &CopyForm) -> AppResult<BookInstance> {
        let query = format!(
            "INSERT INTO book_instances ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = INSTANCE_COLUMNS
        );
        let copy = sqlx::query_as::<_, BookInstance>(&query)
            .bind(Uuid::new_v4())
            .bind(book_id)
            .bind(&form.imprint)
            .bind(form.due_back)
            .bind(form.status)
            .bind(form.borrower)
            .fetch_one(&self.pool)
            .await?;
        Ok(copy)
    }

    async fn update(&self, id: Uuid, form: &CopyForm) -> AppResult<BookInstance> {
        let query = format!(
            "UPDATE book_instances SET imprint = $1, due_back = $2, status = $3, borrower_id = $4 WHERE id = $5 RETURNING {}",
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(&form.imprint)
            .bind(form.due_back)
            .bind(form.status)
            .bind(form.borrower)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book copy {} not found", id)))
    }
}
