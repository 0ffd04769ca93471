//! Loan and book copy endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        renewal::{RenewBookForm, RenewalContext},
        BookInstanceForm, BorrowedCopy, PageQuery,
    },
    services::loans::RenewalOutcome,
    AppState,
};

use super::{AuthenticatedUser, Librarian, PaginatedResponse};

/// Copies on loan to the caller, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "The caller's loans", body = PaginatedResponse<BorrowedCopy>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedCopy>>> {
    let per_page = state.config.catalog.page_size;
    let copies = state
        .services
        .loans
        .borrowed_by(claims.user_id, query.offset(per_page), per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(copies, query.page(), per_page)))
}

/// Every copy on loan with its borrower, soonest due first
#[utoipa::path(
    get,
    path = "/catalog/borrowed/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans", body = PaginatedResponse<BorrowedCopy>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowedCopy>>> {
    let per_page = state.config.catalog.page_size;
    let copies = state
        .services
        .loans
        .all_borrowed(query.offset(per_page), per_page)
        .await?;
    Ok(Json(PaginatedResponse::new(copies, query.page(), per_page)))
}

/// Renewal form for a copy, proposing a date three weeks from today
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal form", body = RenewalContext),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalContext>> {
    let today = Utc::now().date_naive();
    let context = state.services.loans.renewal_form(id, today).await?;
    Ok(Json(context))
}

/// Set a new due date, between today and four weeks ahead
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = RenewBookForm,
    responses(
        (status = 303, description = "Renewed; Location is the list of all loans"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Date refused; the form with its errors", body = RenewalContext)
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewBookForm>,
) -> AppResult<Response> {
    let today = Utc::now().date_naive();
    let response = match state.services.loans.renew(id, form.renewal_date, today).await? {
        RenewalOutcome::Renewed(_) => Redirect::to("/catalog/borrowed/").into_response(),
        RenewalOutcome::Rejected(context) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(context)).into_response()
        }
    };
    Ok(response)
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/create/",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Created; Location is the book"),
        (status = 400, description = "Invalid input or unknown reference", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Redirect> {
    let instance = state.services.catalog.create_instance(form).await?;
    Ok(Redirect::to(&format!("/catalog/book/{}", instance.book_id)))
}

/// Replace a copy's fields, status included
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/update/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Updated; Location is the book"),
        (status = 400, description = "Invalid input or unknown reference", body = crate::error::ErrorResponse),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<Uuid>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Redirect> {
    let instance = state.services.catalog.update_instance(id, form).await?;
    Ok(Redirect::to(&format!("/catalog/book/{}", instance.book_id)))
}

/// Remove a copy from circulation
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/delete/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 303, description = "Deleted; Location is the book"),
        (status = 404, description = "Book instance not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    let instance = state.services.catalog.delete_instance(id).await?;
    Ok(Redirect::to(&format!("/catalog/book/{}", instance.book_id)))
}
