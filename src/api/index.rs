//! Home page

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::{error::AppResult, models::stats::CatalogSummary, AppState};

use super::session_from_cookies;

/// Catalog counts and the number of this visit
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary; sets the session cookie when missing", body = CatalogSummary)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<CatalogSummary>)> {
    let (jar, session) = session_from_cookies(jar, &state.config.sessions.cookie_name);
    let summary = state.services.stats.summary(&session).await?;
    Ok((jar, Json(summary)))
}
