//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};

use crate::{
    error::AppResult,
    models::{Author, AuthorDetail, AuthorForm, PageQuery},
    AppState,
};

use super::{Librarian, PaginatedResponse};

/// List authors ordered by last name then first name
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = PaginatedResponse<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    let per_page = state.config.catalog.page_size;
    let authors = state
        .services
        .catalog
        .list_authors(query.offset(per_page), per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(authors, query.page(), per_page)))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Create an author and redirect to it
#[utoipa::path(
    post,
    path = "/catalog/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created; Location is the new author"),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing can_mark_returned")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    let author = state.services.catalog.create_author(form).await?;
    Ok(Redirect::to(&format!("/catalog/author/{}", author.id)))
}

/// Replace an author's fields and redirect to it
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated; Location is the author"),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Redirect> {
    let author = state.services.catalog.update_author(id, form).await?;
    Ok(Redirect::to(&format!("/catalog/author/{}", author.id)))
}

/// Delete an author; their books remain without an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted; Location is the author list"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.catalog.delete_author(id).await?;
    Ok(Redirect::to("/catalog/authors/"))
}
