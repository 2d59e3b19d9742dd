//! Domain layer containing business entities and logic.
//!
//! Independent of HTTP and of any particular store.
//!
//! # Architecture
//!
//! - [`entities`] - Link records
//! - [`repositories`] - Link store trait
//! - [`lifecycle`] - Expiry, hit limits and sweep eligibility
//! - [`allocator`] - Collision-aware id allocation
//! - [`errors`] - Error taxonomy shared by the layers above
//!
//! # Link Lifecycle
//!
//! 1. [`allocator::IdAllocator`] reserves a fresh id and inserts the record
//! 2. Lookups return the record only while it is resolvable
//! 3. Each redirect increments `hit_count` in one conditional store update
//! 4. The sweep deletes records that can never resolve again

pub mod allocator;
pub mod entities;
pub mod errors;
pub mod lifecycle;
pub mod repositories;
