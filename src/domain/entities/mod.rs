//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures. The only logic they carry is the
//! resolvability predicate, which every store implementation must agree with.
//!
//! # Design Pattern
//!
//! - [`LinkRecord`] - A persisted link
//! - [`NewLinkRecord`] - Creation input before an id is allocated

pub mod link;

pub use link::{LinkRecord, NewLinkRecord};
