//! DTOs for link endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::CreateLink;
use crate::domain::entities::LinkRecord;
use crate::domain::lifecycle::format_timestamp;

/// Request to create a link.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Target URL; scheme optional.
    #[validate(length(min = 1, max = 2048))]
    pub destination: String,

    /// Seconds until the link self-destructs. Absent or `0` never expires.
    /// Bounded by `MAX_SELF_DESTRUCT_SECONDS` in either direction.
    #[validate(range(
        min = -3_153_600_000i64,
        max = 3_153_600_000i64,
        message = "self_destruct is out of range"
    ))]
    pub self_destruct: Option<i64>,

    /// Hit limit. Absent or `0` is unlimited.
    #[serde(alias = "max_page_hits")]
    #[validate(range(min = 0, message = "max_hits must be zero or positive"))]
    pub max_hits: Option<i64>,

    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

impl CreateLinkRequest {
    pub fn into_input(self, owner_token: Option<String>) -> CreateLink {
        CreateLink {
            destination: self.destination,
            self_destruct_seconds: self.self_destruct,
            max_hits: self.max_hits,
            owner_token,
            password: self.password,
        }
    }
}

/// Public view of a link. Timestamps use the fixed `YYYY-MM-DDTHH:MM:SSZ` form.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub short_url: String,
    /// Hidden for password-protected links outside the owner's listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub created_at: String,
    pub self_destruct_at: Option<String>,
    pub max_hits: i64,
    pub hit_count: i64,
    pub password_protected: bool,
}

impl LinkResponse {
    /// Full view, for the creator.
    pub fn for_owner(record: &LinkRecord, short_url: String) -> Self {
        Self {
            id: record.id.clone(),
            short_url,
            destination: Some(record.destination.clone()),
            created_at: format_timestamp(record.created_at),
            self_destruct_at: record.self_destruct_at.map(format_timestamp),
            max_hits: record.max_hits,
            hit_count: record.hit_count,
            password_protected: record.is_password_protected(),
        }
    }

    /// View for anyone holding the id.
    pub fn for_visitor(record: &LinkRecord, short_url: String) -> Self {
        let mut view = Self::for_owner(record, short_url);
        if view.password_protected {
            view.destination = None;
        }
        view
    }
}

/// Response to a successful create; the owner token is only ever returned here.
#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub owner_token: String,
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub total: usize,
    pub items: Vec<LinkResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeleteLinkResponse {
    pub id: String,
    pub deleted: bool,
}

/// Query string accepted by the redirect.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub password: Option<String>,
}
