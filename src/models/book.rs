//! Book (bibliographic record) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstance,
    genre::{Genre, Language},
};

/// Book row as stored, without its genre set
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i32>,
}

impl BookRow {
    pub fn with_genres(self, genre_ids: Vec<i32>) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author_id: self.author_id,
            summary: self.summary,
            isbn: self.isbn,
            genre_ids,
            language_id: self.language_id,
        }
    }
}

/// Full book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    /// Absent when the author has been deleted
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

/// Short book representation for author pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub summary: String,
}

impl From<&Book> for BookShort {
    fn from(book: &Book) -> Self {
        BookShort {
            id: book.id,
            title: book.title.clone(),
            summary: book.summary.clone(),
        }
    }
}

/// Book entry in the paginated listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookListEntry {
    pub id: i32,
    pub title: String,
    pub author: Option<Author>,
}

/// Book with its resolved relations and circulating copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub author: Option<Author>,
    pub summary: String,
    pub isbn: String,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub language: Option<Language>,
    pub copies: Vec<BookInstance>,
}

/// Create or update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Select at least one genre"))]
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

impl BookForm {
    pub fn into_book(self, id: i32) -> Book {
        let mut genre_ids = self.genre_ids;
        genre_ids.sort_unstable();
        genre_ids.dedup();
        Book {
            id,
            title: self.title,
            author_id: self.author_id,
            summary: self.summary,
            isbn: self.isbn,
            genre_ids,
            language_id: self.language_id,
        }
    }
}

/// Names of the first three genres, comma separated
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
