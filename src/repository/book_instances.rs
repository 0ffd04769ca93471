//! Book instances repository for database operations

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use super::{BookInstanceStore, Paged};
use crate::{
    error::{AppError, AppResult},
    models::{BookInstance, BorrowedCopy, LoanStatus, UserShort},
};

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, borrower_id, status FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, borrower_id, status
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back NULLS LAST, id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Paged<BorrowedCopy>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)",
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back, bi.status,
                   u.id AS user_id, u.username
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back NULLS LAST, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();

        let items = rows
            .into_iter()
            .map(|row| {
                let due_back: Option<NaiveDate> = row.get("due_back");
                let user_id: Option<i32> = row.get("user_id");
                BorrowedCopy {
                    id: row.get("id"),
                    book_id: row.get("book_id"),
                    book_title: row.get("book_title"),
                    imprint: row.get("imprint"),
                    due_back,
                    status: row.get("status"),
                    borrower: user_id.map(|id| UserShort {
                        id,
                        username: row.get("username"),
                    }),
                    is_overdue: due_back.map(|d| d < today).unwrap_or(false),
                }
            })
            .collect();

        Ok(Paged { items, total })
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let created = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, book_id, imprint, due_back, borrower_id, status
            "#,
        )
        .bind(instance.id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, "Book instance"))?;

        Ok(created)
    }

    async fn update(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, borrower_id = $4, status = $5
            WHERE id = $6
            RETURNING id, book_id, imprint, due_back, borrower_id, status
            "#,
        )
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .bind(instance.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, "Book instance"))?
        .ok_or_else(|| not_found(instance.id))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances SET due_back = $1 WHERE id = $2
            RETURNING id, book_id, imprint, due_back, borrower_id, status
            "#,
        )
        .bind(due_back)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE ($1::varchar IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
