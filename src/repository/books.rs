//! Books repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};

use super::{BookStore, Paged};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookRow, Author, Book, BookForm, BookListEntry, BookShort,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn genre_ids(&self, book_id: i32) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT genre_id FROM book_genres WHERE book_id = $1 ORDER BY genre_id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Paged<BookListEntry>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        // Ordering by author follows the author's own ordering (last, first name)
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.title,
                   a.id AS author_id, a.first_name, a.last_name,
                   a.date_of_birth, a.date_of_death
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            ORDER BY b.title, a.last_name, a.first_name, b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let author_id: Option<i32> = row.get("author_id");
                BookListEntry {
                    id: row.get("id"),
                    title: row.get("title"),
                    author: author_id.map(|id| Author {
                        id,
                        first_name: row.get("first_name"),
                        last_name: row.get("last_name"),
                        date_of_birth: row.get::<Option<NaiveDate>, _>("date_of_birth"),
                        date_of_death: row.get::<Option<NaiveDate>, _>("date_of_death"),
                    }),
                }
            })
            .collect();

        Ok(Paged { items, total })
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author_id, summary, isbn, language_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let genre_ids = self.genre_ids(id).await?;
        Ok(row.with_genres(genre_ids))
    }

    async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let books = sqlx::query_as::<_, BookShort>(
            "SELECT id, title, summary FROM books WHERE author_id = $1 ORDER BY title, id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author_id, summary, isbn, language_id
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Book"))?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(row.id)
        .bind(&form.genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Book genre"))?;

        tx.commit().await?;

        let id = row.id;
        Ok(row.with_genres(self.genre_ids(id).await?))
    }

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5
            WHERE id = $6
            RETURNING id, title, author_id, summary, isbn, language_id
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Book"))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&form.genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Book genre"))?;

        tx.commit().await?;

        Ok(row.with_genres(self.genre_ids(id).await?))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        // book_instances.book_id is ON DELETE RESTRICT, surfacing as 23503
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_db(e, "Book"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };

        Ok(exists)
    }
}
