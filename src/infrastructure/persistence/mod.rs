//! Link store implementations.
//!
//! Both implement [`crate::domain::repositories::LinkRepository`] and are
//! interchangeable; the services never branch on which one is in use.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - PostgreSQL storage with per-statement timeout and retry
//! - [`MemoryLinkRepository`] - In-process storage for development and tests

pub mod memory_link_repository;
pub mod pg_link_repository;
pub mod store_call;

pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
