//! Catalog management service: authors, books, copies, genres and languages

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::display_genre, Author, AuthorDetail, AuthorForm, Book, BookDetail, BookForm,
        BookInstance, BookInstanceForm, BookListEntry, CreateNamed, Genre, Language,
    },
    repository::{Paged, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Books

    /// One page of books ordered by title then author
    pub async fn list_books(&self, offset: i64, limit: i64) -> AppResult<Paged<BookListEntry>> {
        self.repository.books.list(offset, limit).await
    }

    /// Book with author, language, genres and copies resolved
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get(language_id).await?),
            None => None,
        };
        let genres = self.repository.genres.get_many(&book.genre_ids).await?;
        let copies = self.repository.instances.for_book(book.id).await?;

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            author,
            summary: book.summary,
            isbn: book.isbn,
            display_genre: display_genre(&genres),
            genres,
            language,
            copies,
        })
    }

    pub async fn create_book(&self, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        if self.repository.books.isbn_exists(&form.isbn, None).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                form.isbn
            )));
        }
        self.check_book_references(&form).await?;

        let book = self.repository.books.create(&form).await?;
        tracing::info!("Created book id={} isbn={}", book.id, book.isbn);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, form: BookForm) -> AppResult<Book> {
        form.validate()?;
        self.repository.books.get(id).await?;
        if self.repository.books.isbn_exists(&form.isbn, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                form.isbn
            )));
        }
        self.check_book_references(&form).await?;

        let book = self.repository.books.update(id, &form).await?;
        tracing::info!("Updated book id={}", book.id);
        Ok(book)
    }

    /// Delete a book; refused with an integrity error while copies exist
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    /// Referenced author, language and genres must exist
    async fn check_book_references(&self, form: &BookForm) -> AppResult<()> {
        if let Some(author_id) = form.author_id {
            self.repository
                .authors
                .get(author_id)
                .await
                .map_err(|e| unknown_reference(e, "author", author_id))?;
        }
        if let Some(language_id) = form.language_id {
            self.repository
                .languages
                .get(language_id)
                .await
                .map_err(|e| unknown_reference(e, "language", language_id))?;
        }

        let mut wanted = form.genre_ids.clone();
        wanted.sort_unstable();
        wanted.dedup();
        let found = self.repository.genres.get_many(&wanted).await?;
        if let Some(missing) = wanted.iter().find(|id| !found.iter().any(|g| g.id == **id)) {
            return Err(AppError::Validation(format!("Unknown genre {}", missing)));
        }
        Ok(())
    }

    // Authors

    pub async fn list_authors(&self, offset: i64, limit: i64) -> AppResult<Paged<Author>> {
        self.repository.authors.list(offset, limit).await
    }

    /// Author with the books they wrote
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get(id).await?;
        let books = self.repository.books.by_author(id).await?;
        Ok(AuthorDetail { author, books })
    }

    pub async fn create_author(&self, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Created author id={} ({})", author.id, author);
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, form: AuthorForm) -> AppResult<Author> {
        form.validate()?;
        let author = self.repository.authors.update(id, &form).await?;
        tracing::info!("Updated author id={}", author.id);
        Ok(author)
    }

    /// Delete an author; their books stay in the catalog without an author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author id={}", id);
        Ok(())
    }

    // Copies

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get(id).await
    }

    /// Register a new copy under a fresh UUID
    pub async fn create_instance(&self, form: BookInstanceForm) -> AppResult<BookInstance> {
        form.validate()?;
        self.check_instance_references(&form).await?;
        let instance = self
            .repository
            .instances
            .create(&form.into_instance(Uuid::new_v4()))
            .await?;
        tracing::info!(
            "Created copy {} of book id={} ({})",
            instance.id,
            instance.book_id,
            instance.status
        );
        Ok(instance)
    }

    /// Replace every field of a copy; any status may follow any other
    pub async fn update_instance(&self, id: Uuid, form: BookInstanceForm) -> AppResult<BookInstance> {
        form.validate()?;
        self.repository.instances.get(id).await?;
        self.check_instance_references(&form).await?;
        let instance = self
            .repository
            .instances
            .update(&form.into_instance(id))
            .await?;
        tracing::info!("Updated copy {} ({})", instance.id, instance.status);
        Ok(instance)
    }

    /// Delete a copy, returning what was removed
    pub async fn delete_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.instances.get(id).await?;
        self.repository.instances.delete(id).await?;
        tracing::info!("Deleted copy {} of book id={}", id, instance.book_id);
        Ok(instance)
    }

    async fn check_instance_references(&self, form: &BookInstanceForm) -> AppResult<()> {
        self.repository
            .books
            .get(form.book_id)
            .await
            .map_err(|e| unknown_reference(e, "book", form.book_id))?;
        if let Some(borrower_id) = form.borrower_id {
            self.repository
                .users
                .get(borrower_id)
                .await
                .map_err(|e| unknown_reference(e, "borrower", borrower_id))?;
        }
        Ok(())
    }

    // Genres and languages

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, form: CreateNamed) -> AppResult<Genre> {
        form.validate()?;
        let genre = self.repository.genres.create(form.name.trim()).await?;
        tracing::info!("Created genre id={} ({})", genre.id, genre.name);
        Ok(genre)
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn create_language(&self, form: CreateNamed) -> AppResult<Language> {
        form.validate()?;
        let language = self.repository.languages.create(form.name.trim()).await?;
        tracing::info!("Created language id={} ({})", language.id, language.name);
        Ok(language)
    }
}

/// A form pointing at a missing record is a bad request, not a 404
fn unknown_reference(err: AppError, what: &str, id: i32) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::Validation(format!("Unknown {} {}", what, id)),
        other => other,
    }
}
