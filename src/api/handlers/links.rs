//! Handlers for owner-facing link endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, CreateLinkResponse, DeleteLinkResponse, LinkListResponse, LinkResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::owner_token::{owner_token_from_headers, require_owner_token};

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// # Request
///
/// ```json
/// { "destination": "https://example.com", "self_destruct": 3600, "max_hits": 3, "password": "pw" }
/// ```
///
/// The owner token is read from `X-Owner-Token`. When absent a new one is
/// generated and returned; it is the only credential for listing and
/// deleting the link later.
///
/// # Response Codes
///
/// - **201 Created**
/// - **400 Bad Request**: invalid destination, negative hit limit
/// - **503 Service Unavailable**: no free id or store unavailable
pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    payload.validate()?;

    let owner_token = owner_token_from_headers(&headers)?;
    let record = state
        .link_service
        .create_link(payload.into_input(owner_token))
        .await?;

    let short_url = state.link_service.short_url(&record.id);
    let response = CreateLinkResponse {
        link: LinkResponse::for_owner(&record, short_url),
        owner_token: record.owner_token,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Returns a resolvable link without counting a hit.
///
/// # Endpoint
///
/// `GET /api/urls/{id}`
///
/// Password-protected links are returned without their destination.
pub async fn get_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let record = state.link_service.resolve_link(&id).await?;
    let short_url = state.link_service.short_url(&record.id);

    Ok(Json(LinkResponse::for_visitor(&record, short_url)))
}

/// Lists every link created with the caller's owner token, newest first.
///
/// # Endpoint
///
/// `GET /api/urls` with `X-Owner-Token`
///
/// Includes expired and exhausted links that have not been swept yet.
pub async fn list_links_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LinkListResponse>, AppError> {
    let owner_token = require_owner_token(&headers)?;
    let records = state.link_service.list_owner_links(&owner_token).await?;

    let items: Vec<LinkResponse> = records
        .iter()
        .map(|r| LinkResponse::for_owner(r, state.link_service.short_url(&r.id)))
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Deletes a link owned by the caller.
///
/// # Endpoint
///
/// `DELETE /api/urls/{id}` with `X-Owner-Token`
///
/// # Response Codes
///
/// - **200 OK**: deleted
/// - **404 Not Found**: unknown id or owned by someone else
pub async fn delete_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeleteLinkResponse>, AppError> {
    let owner_token = require_owner_token(&headers)?;

    if !state.link_service.delete_link(&id, &owner_token).await? {
        return Err(AppError::not_found(
            "Link not found",
            serde_json::json!({ "id": id }),
        ));
    }

    Ok(Json(DeleteLinkResponse { id, deleted: true }))
}
