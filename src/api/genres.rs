//! Genre and language endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{CreateNamed, Genre, Language},
    AppState,
};

use super::Librarian;

/// All genres ordered by name
#[utoipa::path(
    get,
    path = "/catalog/genres/",
    tag = "genres",
    responses((status = 200, description = "Genres", body = Vec<Genre>))
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.services.catalog.list_genres().await?))
}

#[utoipa::path(
    post,
    path = "/catalog/genres/",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid name", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Json(form): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state.services.catalog.create_genre(form).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// All languages ordered by name
#[utoipa::path(
    get,
    path = "/catalog/languages/",
    tag = "genres",
    responses((status = 200, description = "Languages", body = Vec<Language>))
)]
pub async fn list_languages(State(state): State<AppState>) -> AppResult<Json<Vec<Language>>> {
    Ok(Json(state.services.catalog.list_languages().await?))
}

#[utoipa::path(
    post,
    path = "/catalog/languages/",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Invalid name", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    Librarian(_claims): Librarian,
    Json(form): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state.services.catalog.create_language(form).await?;
    Ok((StatusCode::CREATED, Json(language)))
}
