//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::{BookDetail, BookForm, BookListEntry, PageQuery},
    AppState,
};

use super::{Librarian, PaginatedResponse};

/// List books ordered by title then author
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = PaginatedResponse<BookListEntry>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookListEntry>>> {
    let per_page = state.config.catalog.page_size;
    let books = state
        .services
        .catalog
        .list_books(query.offset(per_page), per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(books, query.page(), per_page)))
}

/// Book with its author, language, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a book and redirect to it
#[utoipa::path(
    post,
    path = "/catalog/book/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Created; Location is the new book"),
        (status = 400, description = "Invalid input or unknown reference", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 409, description = "ISBN already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    let book = state.services.catalog.create_book(form).await?;
    Ok(Redirect::to(&format!("/catalog/book/{}", book.id)))
}

/// Replace a book's fields and redirect to it
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated; Location is the book"),
        (status = 400, description = "Invalid input or unknown reference", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<i32>,
    Json(form): Json<BookForm>,
) -> AppResult<Redirect> {
    let book = state.services.catalog.update_book(id, form).await?;
    Ok(Redirect::to(&format!("/catalog/book/{}", book.id)))
}

/// Delete a book that has no copies
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Deleted; Location is the book list"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copies of the book still exist", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to("/catalog/books/"))
}
