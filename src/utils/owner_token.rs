//! Owner token extraction from HTTP request headers.

use axum::http::HeaderMap;
use serde_json::json;

use crate::error::AppError;

/// Header carrying the creator's owner token.
pub const OWNER_TOKEN_HEADER: &str = "x-owner-token";

/// Returns the owner token if the header is present and non-blank.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the header value is not valid UTF-8.
pub fn owner_token_from_headers(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(OWNER_TOKEN_HEADER) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid X-Owner-Token header", json!({})))?
        .trim();

    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// Like [`owner_token_from_headers`] but the token is mandatory.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the header is missing or blank.
pub fn require_owner_token(headers: &HeaderMap) -> Result<String, AppError> {
    owner_token_from_headers(headers)?.ok_or_else(|| {
        AppError::bad_request(
            "Missing X-Owner-Token header",
            json!({ "header": OWNER_TOKEN_HEADER }),
        )
    })
}
