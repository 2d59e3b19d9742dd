//! Application layer services implementing business logic.
//!
//! Services consume the [`LinkRepository`](crate::domain::repositories::LinkRepository)
//! trait and expose the operations HTTP handlers and the admin CLI call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, resolution and deletion
//! - [`services::lifecycle_service::LifecycleService`] - Sweep of expired and exhausted links
//! - [`services::auth_service::AuthService`] - Link passwords and admin key checks

pub mod services;
