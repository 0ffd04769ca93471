//! HTTP handlers for the catalog endpoints

pub mod accounts;
pub mod authors;
pub mod books;
pub mod genres;
pub mod health;
pub mod index;
pub mod instances;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{Permission, Principal, UserClaims},
    repository::Paged,
    sessions::SessionId,
    AppState,
};

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Records on this page
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    /// Current page number, starting at 1
    pub page: i64,
    /// Records per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(paged: Paged<T>, page: i64, per_page: i64) -> Self {
        Self {
            items: paged.items,
            total: paged.total,
            page,
            per_page,
        }
    }
}

/// Whoever is making the request, possibly nobody.
///
/// A request without an `Authorization` header is anonymous; a request with
/// a malformed or expired token is rejected.
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(CurrentPrincipal(Principal::Anonymous));
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Authentication("Invalid authorization header format".to_string())
            })?;

        let claims = state.services.auth.verify_token(token)?;
        Ok(CurrentPrincipal(Principal::User(claims)))
    }
}

/// Extractor for an authenticated user
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        let claims = principal.require_login()?.clone();
        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor for a user allowed to manage loans and the catalog.
///
/// Placed before body and path extractors so the capability check runs
/// before any input is looked at.
pub struct Librarian(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for Librarian {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;
        let claims = principal.require(Permission::CanMarkReturned)?.clone();
        Ok(Librarian(claims))
    }
}

/// Session carried by the session cookie, issuing a fresh one when the
/// cookie is missing or unreadable
pub fn session_from_cookies(jar: CookieJar, cookie_name: &str) -> (CookieJar, SessionId) {
    if let Some(session) = jar.get(cookie_name).and_then(|c| SessionId::parse(c.value())) {
        return (jar, session);
    }

    let session = SessionId::generate();
    let cookie = Cookie::build((cookie_name.to_string(), session.to_string()))
        .path("/")
        .http_only(true);
    (jar.add(cookie), session)
}

/// Build the application router with every route
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Full paths are registered so the trailing slashes stay significant
    let routes = Router::new()
        .route("/", get(|| async { Redirect::permanent("/catalog/") }))
        .route("/catalog", get(|| async { Redirect::permanent("/catalog/") }))
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/me/", get(accounts::me))
        // Home
        .route("/catalog/", get(index::index))
        // Books
        .route("/catalog/books/", get(books::list_books))
        .route("/catalog/book/create/", post(books::create_book))
        .route("/catalog/book/:id", get(books::get_book))
        .route("/catalog/book/:id/update/", post(books::update_book))
        .route("/catalog/book/:id/delete/", post(books::delete_book))
        // Authors
        .route("/catalog/authors/", get(authors::list_authors))
        .route("/catalog/author/create/", post(authors::create_author))
        .route("/catalog/author/:id", get(authors::get_author))
        .route("/catalog/author/:id/update/", post(authors::update_author))
        .route("/catalog/author/:id/delete/", post(authors::delete_author))
        // Loans
        .route("/catalog/mybooks/", get(instances::my_borrowed))
        .route("/catalog/borrowed/", get(instances::all_borrowed))
        .route(
            "/catalog/book/:id/renew/",
            get(instances::renew_form).post(instances::renew),
        )
        // Copies
        .route(
            "/catalog/bookinstance/create/",
            post(instances::create_instance),
        )
        .route(
            "/catalog/bookinstance/:id/update/",
            post(instances::update_instance),
        )
        .route(
            "/catalog/bookinstance/:id/delete/",
            post(instances::delete_instance),
        )
        // Genres and languages
        .route(
            "/catalog/genres/",
            get(genres::list_genres).post(genres::create_genre),
        )
        .route(
            "/catalog/languages/",
            get(genres::list_languages).post(genres::create_language),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
