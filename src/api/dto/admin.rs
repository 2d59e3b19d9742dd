//! DTOs for admin endpoints.

use serde::Serialize;

use super::links::LinkResponse;

#[derive(Debug, Serialize)]
pub struct ExpiredListResponse {
    pub total: usize,
    pub items: Vec<LinkResponse>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NewIdResponse {
    pub id: String,
    pub short_url: String,
}
