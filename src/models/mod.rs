//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod renewal;
pub mod stats;
pub mod user;

use serde::Deserialize;
use utoipa::IntoParams;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorForm};
pub use book::{Book, BookDetail, BookForm, BookListEntry, BookShort};
pub use book_instance::{BookInstance, BookInstanceForm, BorrowedCopy, LoanStatus};
pub use genre::{CreateNamed, Genre, Language};
pub use user::{Permission, Principal, User, UserClaims, UserShort};

/// Page selection for paginated listings
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
}

impl PageQuery {
    /// Requested page, clamped to at least 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Rows to skip; a page past the end of the i64 range saturates
    pub fn offset(&self, per_page: i64) -> i64 {
        (self.page() - 1).saturating_mul(per_page)
    }
}
