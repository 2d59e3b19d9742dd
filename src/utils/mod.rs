//! Helpers shared by the services and HTTP layer.
//!
//! - [`id_generator`] - Random identifiers and owner tokens
//! - [`destination`] - Destination URL validation
//! - [`owner_token`] - Owner token extraction from HTTP headers

pub mod destination;
pub mod id_generator;
pub mod owner_token;
