//! In-process implementation of every store
//!
//! Enforces the same rules as the database schema: unique ISBNs and
//! usernames, author and language references nulled on delete, book
//! deletion restricted while copies exist.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AuthorStore, BookInstanceStore, BookStore, GenreStore, LanguageStore, Paged, UserStore,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        user::CreateUser, Author, AuthorForm, Book, BookForm, BookInstance, BookListEntry,
        BookShort, BorrowedCopy, Genre, Language, LoanStatus, User,
    },
};

#[derive(Default)]
struct Tables {
    next_id: i32,
    genres: BTreeMap<i32, Genre>,
    languages: BTreeMap<i32, Language>,
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    instances: HashMap<Uuid, BookInstance>,
    users: BTreeMap<i32, User>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_book_references(&self, form: &BookForm) -> AppResult<()> {
        if let Some(author_id) = form.author_id {
            if !self.authors.contains_key(&author_id) {
                return Err(AppError::Integrity(format!("Author {} does not exist", author_id)));
            }
        }
        if let Some(language_id) = form.language_id {
            if !self.languages.contains_key(&language_id) {
                return Err(AppError::Integrity(format!(
                    "Language {} does not exist",
                    language_id
                )));
            }
        }
        if let Some(genre_id) = form.genre_ids.iter().find(|id| !self.genres.contains_key(id)) {
            return Err(AppError::Integrity(format!("Genre {} does not exist", genre_id)));
        }
        Ok(())
    }

    fn check_isbn_free(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<()> {
        let taken = self
            .books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != exclude_id);
        if taken {
            return Err(AppError::Conflict("Book already exists".to_string()));
        }
        Ok(())
    }

    fn check_instance_references(&self, instance: &BookInstance) -> AppResult<()> {
        if !self.books.contains_key(&instance.book_id) {
            return Err(AppError::Integrity(format!(
                "Book {} does not exist",
                instance.book_id
            )));
        }
        if let Some(borrower_id) = instance.borrower_id {
            if !self.users.contains_key(&borrower_id) {
                return Err(AppError::Integrity(format!("User {} does not exist", borrower_id)));
            }
        }
        Ok(())
    }

    fn author_sort_key(&self, author_id: Option<i32>) -> Option<(String, String)> {
        author_id
            .and_then(|id| self.authors.get(&id))
            .map(|a| (a.last_name.clone(), a.first_name.clone()))
    }
}

/// Thread-safe in-memory store implementing every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn page<T>(items: Vec<T>, offset: i64, limit: i64) -> Paged<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    Paged { items, total }
}

/// `None` sorts after every `Some`, like `NULLS LAST`
fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

#[async_trait]
impl GenreStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = tables.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn get_many(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = ids
            .iter()
            .filter_map(|id| tables.genres.get(id).cloned())
            .collect();
        genres.sort_by_key(|g| g.id);
        genres.dedup_by_key(|g| g.id);
        Ok(genres)
    }

    async fn create(&self, name: &str) -> AppResult<Genre> {
        let mut tables = self.tables.write().await;
        let genre = Genre {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }
}

#[async_trait]
impl LanguageStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Language>> {
        let tables = self.tables.read().await;
        let mut languages: Vec<Language> = tables.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(languages)
    }

    async fn get(&self, id: i32) -> AppResult<Language> {
        self.tables
            .read()
            .await
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create(&self, name: &str) -> AppResult<Language> {
        let mut tables = self.tables.write().await;
        let language = Language {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.languages.insert(language.id, language.clone());
        Ok(language)
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Paged<Author>> {
        let tables = self.tables.read().await;
        let mut authors: Vec<Author> = tables.authors.values().cloned().collect();
        authors.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(page(authors, offset, limit))
    }

    async fn get(&self, id: i32) -> AppResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn create(&self, form: &AuthorForm) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let author = form.clone().into_author(tables.next_id());
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;
        *slot = form.clone().into_author(id);
        Ok(slot.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.authors.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        for book in tables.books.values_mut() {
            if book.author_id == Some(id) {
                book.author_id = None;
            }
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Paged<BookListEntry>> {
        let tables = self.tables.read().await;
        let mut books: Vec<&Book> = tables.books.values().collect();
        books.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| {
                    nulls_last(
                        &tables.author_sort_key(a.author_id),
                        &tables.author_sort_key(b.author_id),
                    )
                })
                .then(a.id.cmp(&b.id))
        });
        let entries = books
            .into_iter()
            .map(|book| BookListEntry {
                id: book.id,
                title: book.title.clone(),
                author: book.author_id.and_then(|id| tables.authors.get(&id).cloned()),
            })
            .collect();
        Ok(page(entries, offset, limit))
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        self.tables
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn by_author(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let tables = self.tables.read().await;
        let mut books: Vec<&Book> = tables
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books.into_iter().map(BookShort::from).collect())
    }

    async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        tables.check_isbn_free(&form.isbn, None)?;
        tables.check_book_references(form)?;
        let book = form.clone().into_book(tables.next_id());
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        tables.check_isbn_free(&form.isbn, Some(id))?;
        tables.check_book_references(form)?;
        let book = form.clone().into_book(id);
        tables.books.insert(id, book.clone());
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if tables.instances.values().any(|i| i.book_id == id) {
            return Err(AppError::Integrity(
                "Book is referenced by other records".to_string(),
            ));
        }
        tables.books.remove(&id);
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.check_isbn_free(isbn, exclude_id).is_err())
    }
}

#[async_trait]
impl BookInstanceStore for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        self.tables
            .read()
            .await
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        let mut instances: Vec<BookInstance> = tables
            .instances
            .values()
            .filter(|i| i.book_id == book_id)
            .cloned()
            .collect();
        instances.sort_by(|a, b| BookInstance::due_back_order(a, b).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<Paged<BorrowedCopy>> {
        let tables = self.tables.read().await;
        let today = Utc::now().date_naive();

        let mut instances: Vec<&BookInstance> = tables
            .instances
            .values()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.is_none() || i.borrower_id == borrower_id)
            .collect();
        instances.sort_by(|a, b| BookInstance::due_back_order(a, b).then(a.id.cmp(&b.id)));

        let copies = instances
            .into_iter()
            .map(|i| BorrowedCopy {
                id: i.id,
                book_id: i.book_id,
                book_title: tables
                    .books
                    .get(&i.book_id)
                    .map(|b| b.title.clone())
                    .unwrap_or_default(),
                imprint: i.imprint.clone(),
                due_back: i.due_back,
                status: i.status,
                borrower: i
                    .borrower_id
                    .and_then(|id| tables.users.get(&id))
                    .map(User::short),
                is_overdue: i.is_overdue_on(today),
            })
            .collect();

        Ok(page(copies, offset, limit))
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let mut tables = self.tables.write().await;
        tables.check_instance_references(instance)?;
        if tables.instances.contains_key(&instance.id) {
            return Err(AppError::Conflict("Book instance already exists".to_string()));
        }
        tables.instances.insert(instance.id, instance.clone());
        Ok(instance.clone())
    }

    async fn update(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let mut tables = self.tables.write().await;
        if !tables.instances.contains_key(&instance.id) {
            return Err(AppError::NotFound(format!(
                "Book instance {} not found",
                instance.id
            )));
        }
        tables.check_instance_references(instance)?;
        tables.instances.insert(instance.id, instance.clone());
        Ok(instance.clone())
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let mut tables = self.tables.write().await;
        let instance = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;
        instance.due_back = Some(due_back);
        Ok(instance.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .instances
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .instances
            .values()
            .filter(|i| status.map(|s| i.status == s).unwrap_or(true))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: i32) -> AppResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: &CreateUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        let created = User {
            id: tables.next_id(),
            username: user.username.clone(),
            password: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            permissions: user.permissions.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }
}
