#![allow(dead_code)]

use axum::{Router, middleware};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use ephemeral_shortener::api::middleware::auth;
use ephemeral_shortener::api::routes::{admin_routes, public_routes};
use ephemeral_shortener::application::services::{AuthService, LinkSettings};
use ephemeral_shortener::domain::entities::LinkRecord;
use ephemeral_shortener::domain::lifecycle::LifecyclePolicy;
use ephemeral_shortener::domain::repositories::LinkRepository;
use ephemeral_shortener::infrastructure::persistence::MemoryLinkRepository;
use ephemeral_shortener::state::AppState;
use std::sync::Arc;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const SERVICE_URL: &str = "https://nolongr.vercel.app";

pub fn create_test_state() -> (AppState, Arc<MemoryLinkRepository>) {
    let repo = Arc::new(MemoryLinkRepository::new());
    let state = state_for(repo.clone());
    (state, repo)
}

pub fn state_for(repo: Arc<dyn LinkRepository>) -> AppState {
    AppState::new(
        repo,
        AuthService::new("test-signing-secret".to_string(), ADMIN_KEY),
        LifecyclePolicy::default(),
        LinkSettings {
            service_url: SERVICE_URL.to_string(),
            id_length: 2,
        },
    )
}

/// `/api` routes as mounted by the app router, without rate limiting.
pub fn api_server(state: AppState) -> TestServer {
    let admin = admin_routes().route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let app = Router::new()
        .nest("/api", Router::new().merge(admin).merge(public_routes()))
        .with_state(state);

    TestServer::new(app).unwrap()
}

pub fn link(id: &str, owner: &str) -> LinkRecord {
    LinkRecord {
        id: id.to_string(),
        destination: "https://example.com".to_string(),
        created_at: Utc::now(),
        self_destruct_at: None,
        max_hits: 0,
        hit_count: 0,
        owner_token: owner.to_string(),
        password_hash: None,
    }
}

pub async fn insert_expired_link(repo: &MemoryLinkRepository, id: &str, at: DateTime<Utc>) {
    repo.insert(LinkRecord {
        self_destruct_at: Some(at),
        ..link(id, "owner")
    })
    .await
    .unwrap();
}
