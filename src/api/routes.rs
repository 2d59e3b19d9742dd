//! API route configuration.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, get_link_handler, list_all_links_handler,
    list_expired_handler, list_links_handler, new_id_handler, sweep_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Link routes, scoped by the `X-Owner-Token` header where ownership matters.
///
/// # Endpoints
///
/// - `POST   /urls`        - Create a link
/// - `GET    /urls`        - List the caller's links
/// - `GET    /urls/{id}`   - Resolve a link without counting a hit
/// - `DELETE /urls/{id}`   - Delete one of the caller's links
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(list_links_handler).post(create_link_handler))
        .route("/urls/{id}", get(get_link_handler).delete(delete_link_handler))
}

/// Admin routes; the caller applies [`crate::api::middleware::auth`].
///
/// # Endpoints
///
/// - `GET    /admin/links`   - List every link across owners
/// - `GET    /admin/expired` - List links the sweep would remove
/// - `DELETE /admin/expired` - Run the sweep
/// - `GET    /admin/new-id`  - Allocate a currently free id
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/expired",
            get(list_expired_handler).delete(sweep_handler),
        )
        .route("/admin/links", get(list_all_links_handler))
        .route("/admin/new-id", get(new_id_handler))
}
