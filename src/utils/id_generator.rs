//! Random identifier generation.
//!
//! Identifiers are drawn uniformly from [`ALPHABET`] using the operating
//! system CSPRNG through `getrandom`. There is no seeded generator and no
//! fallback: if the OS source fails, generation fails.

use crate::domain::errors::LinkError;

/// Characters an identifier may contain: URL path safe without escaping.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_~";

/// Length of generated owner tokens.
pub const OWNER_TOKEN_LENGTH: usize = 24;

/// Path segments owned by the router. A short id must never equal one.
pub const RESERVED_IDS: &[&str] = &["api", "health"];

/// Returns true if `id` collides with a router path segment.
pub fn is_reserved(id: &str) -> bool {
    RESERVED_IDS.contains(&id)
}

/// Returns a uniformly distributed integer in `[0, n)`.
///
/// Draws 32-bit words from the OS and rejects the biased tail, so every
/// value has the same probability regardless of `n`.
///
/// # Errors
///
/// Returns [`LinkError::EntropyUnavailable`] if the OS source cannot be read.
pub fn random_below(n: u32) -> Result<u32, LinkError> {
    debug_assert!(n > 0, "random_below requires a non-empty range");

    let zone = u32::MAX - (u32::MAX % n);
    loop {
        let mut buf = [0u8; 4];
        getrandom::fill(&mut buf).map_err(|e| LinkError::EntropyUnavailable(e.to_string()))?;

        let value = u32::from_le_bytes(buf);
        if value < zone {
            return Ok(value % n);
        }
    }
}

/// Generates a random string of exactly `length` characters from [`ALPHABET`].
///
/// # Errors
///
/// Returns [`LinkError::EntropyUnavailable`] if the OS source cannot be read.
pub fn random_sequence(length: usize) -> Result<String, LinkError> {
    (0..length)
        .map(|_| random_below(ALPHABET.len() as u32).map(|i| ALPHABET[i as usize] as char))
        .collect()
}

/// Source of candidate identifiers for the allocator.
///
/// Implementations do not touch storage; uniqueness is the allocator's job.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Produces a candidate identifier of exactly `length` characters.
    fn generate(&self, length: usize) -> Result<String, LinkError>;
}

/// [`IdGenerator`] backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIdGenerator;

impl IdGenerator for OsIdGenerator {
    fn generate(&self, length: usize) -> Result<String, LinkError> {
        loop {
            let candidate = random_sequence(length)?;
            if !is_reserved(&candidate) {
                return Ok(candidate);
            }
        }
    }
}
