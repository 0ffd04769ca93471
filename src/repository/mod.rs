//! Repository layer: data access contracts and their implementations
//!
//! Each entity gets an async store trait. `Repository` bundles one
//! implementation of each, either PostgreSQL (sqlx) or the in-memory store.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        user::CreateUser, Author, AuthorForm, Book, BookForm, BookInstance, BookListEntry,
        BookShort, BorrowedCopy, Genre, Language, LoanStatus, User,
    },
};

/// One page of a listing together with the size of the whole listing
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait GenreStore: Send + Sync {
    /// All genres ordered by name
    async fn list(&self) -> AppResult<Vec<Genre>>;

    /// Genres with the given ids that exist, ordered by name
    async fn get_many(&self, ids: &[i32]) -> AppResult<Vec<Genre>>;

    async fn create(&self, name: &str) -> AppResult<Genre>;
}

#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Language>>;

    async fn get(&self, id: i32) -> AppResult<Language>;

    async fn create(&self, name: &str) -> AppResult<Language>;
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Authors ordered by last name then first name
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Paged<Author>>;

    async fn get(&self, id: i32) -> AppResult<Author>;

    async fn create(&self, form: &AuthorForm) -> AppResult<Author>;

    async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<Author>;

    /// Delete an author; books written by them keep existing with no author
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Books ordered by title then author
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Paged<BookListEntry>>;

    async fn get(&self, id: i32) -> AppResult<Book>;

    /// Books written by an author, ordered by title
    async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>>;

    async fn create(&self, form: &BookForm) -> AppResult<Book>;

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book>;

    /// Delete a book; refused while any copy references it
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool>;
}

#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Copies of a book ordered by due date
    async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;

    /// Copies on loan ordered by due date, optionally restricted to one borrower
    async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Paged<BorrowedCopy>>;

    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance>;

    async fn update(&self, instance: &BookInstance) -> AppResult<BookInstance>;

    /// Change only the due date of a copy
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Count copies, optionally only those with `status`
    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<User>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn create(&self, user: &CreateUser) -> AppResult<User>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub genres: Arc<dyn GenreStore>,
    pub languages: Arc<dyn LanguageStore>,
    pub authors: Arc<dyn AuthorStore>,
    pub books: Arc<dyn BookStore>,
    pub instances: Arc<dyn BookInstanceStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            languages: Arc::new(genres::LanguagesRepository::new(pool.clone())),
            authors: Arc::new(authors::AuthorsRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            instances: Arc::new(book_instances::BookInstancesRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    /// Create a repository keeping everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            genres: store.clone(),
            languages: store.clone(),
            authors: store.clone(),
            books: store.clone(),
            instances: store.clone(),
            users: store,
        }
    }
}
