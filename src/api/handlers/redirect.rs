//! Handler for short URL redirect.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use tracing::debug;

use crate::api::dto::links::RedirectQuery;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::destination::redirect_target;

/// Redirects a short id to its destination.
///
/// # Endpoint
///
/// `GET /{id}?password=...`
///
/// # Request Flow
///
/// 1. Look up the link, ignoring expired and exhausted records
/// 2. Check the password if the link has one
/// 3. Count the hit (atomically re-checking the limit)
/// 4. Return 307 Temporary Redirect
///
/// # Errors
///
/// - 404 Not Found if the id is unknown, expired or out of hits
/// - 401 Unauthorized if the link is protected and the password is missing or wrong
pub async fn redirect_handler(
    Path(id): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let link = state
        .link_service
        .follow_link(&id, query.password.as_deref())
        .await?;

    debug!(id = %link.id, hit_count = link.hit_count, "Redirecting");

    Ok(Redirect::temporary(&redirect_target(&link.destination)))
}
