//! Handlers for admin endpoints. All sit behind the admin Bearer key.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::api::dto::admin::{ExpiredListResponse, NewIdResponse, SweepResponse};
use crate::api::dto::links::{LinkListResponse, LinkResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists links the next sweep would remove.
///
/// # Endpoint
///
/// `GET /api/admin/expired`
pub async fn list_expired_handler(
    State(state): State<AppState>,
) -> Result<Json<ExpiredListResponse>, AppError> {
    let records = state.lifecycle_service.list_expired(Utc::now()).await?;

    let items: Vec<LinkResponse> = records
        .iter()
        .map(|r| LinkResponse::for_owner(r, state.link_service.short_url(&r.id)))
        .collect();

    Ok(Json(ExpiredListResponse {
        total: items.len(),
        items,
    }))
}

/// Lists every stored link across all owners, newest first.
///
/// # Endpoint
///
/// `GET /api/admin/links`
///
/// Expired and exhausted links are included until the sweep removes them.
pub async fn list_all_links_handler(
    State(state): State<AppState>,
) -> Result<Json<LinkListResponse>, AppError> {
    let records = state.link_service.list_all_links().await?;

    let items: Vec<LinkResponse> = records
        .iter()
        .map(|r| LinkResponse::for_owner(r, state.link_service.short_url(&r.id)))
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Deletes expired (and, per policy, exhausted) links.
///
/// # Endpoint
///
/// `DELETE /api/admin/expired`
///
/// Safe to call repeatedly; a second call at the same moment removes nothing.
pub async fn sweep_handler(
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, AppError> {
    let ids = state.lifecycle_service.sweep_expired(Utc::now()).await?;

    Ok(Json(SweepResponse {
        removed: ids.len(),
        ids,
    }))
}

/// Returns an id that is currently free. Nothing is reserved.
///
/// # Endpoint
///
/// `GET /api/admin/new-id`
pub async fn new_id_handler(
    State(state): State<AppState>,
) -> Result<Json<NewIdResponse>, AppError> {
    let id = state.link_service.allocate_id().await?;
    let short_url = state.link_service.short_url(&id);

    Ok(Json(NewIdResponse { id, short_url }))
}
