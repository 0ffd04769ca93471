//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, authors, books, genres, health, index, instances};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LocalLibrary API",
        version = "0.1.0",
        description = "Library catalog REST API: books, authors, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        accounts::login,
        accounts::me,
        // Home
        index::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Loans and copies
        instances::my_borrowed,
        instances::all_borrowed,
        instances::renew_form,
        instances::renew,
        instances::create_instance,
        instances::update_instance,
        instances::delete_instance,
        // Genres and languages
        genres::list_genres,
        genres::create_genre,
        genres::list_languages,
        genres::create_language,
    ),
    components(
        schemas(
            // Accounts
            accounts::LoginRequest,
            accounts::LoginResponse,
            accounts::UserInfo,
            crate::models::Permission,
            // Catalog
            crate::models::stats::CatalogSummary,
            crate::models::stats::CatalogCounts,
            crate::models::Author,
            crate::models::AuthorDetail,
            crate::models::AuthorForm,
            crate::models::Book,
            crate::models::BookShort,
            crate::models::BookListEntry,
            crate::models::BookDetail,
            crate::models::BookForm,
            crate::models::Genre,
            crate::models::Language,
            crate::models::CreateNamed,
            // Loans
            crate::models::BookInstance,
            crate::models::BookInstanceForm,
            crate::models::BorrowedCopy,
            crate::models::LoanStatus,
            crate::models::UserShort,
            crate::models::renewal::RenewBookForm,
            crate::models::renewal::RenewalFormState,
            crate::models::renewal::RenewalContext,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Login and current user"),
        (name = "catalog", description = "Home page summary"),
        (name = "books", description = "Book records"),
        (name = "authors", description = "Author records"),
        (name = "loans", description = "Copies, loans and renewals"),
        (name = "genres", description = "Genres and languages")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_renewal_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/catalog/book/{id}/renew/"));
        assert!(doc.paths.paths.contains_key("/catalog/mybooks/"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
