//! Error taxonomy of the link lifecycle core.
//!
//! Missing, expired and exhausted links all surface as [`LinkError::NotFound`]
//! so callers cannot tell which condition applied. An owner mismatch on delete
//! is not an error at all; the store reports it as `false`.

use thiserror::Error;

/// Errors produced by the allocator, the lifecycle policy and the link store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Destination is malformed or points back at this service.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Hit limit supplied at creation was negative.
    #[error("Max hits must be zero or positive, got {0}")]
    InvalidMaxHits(i64),

    /// Link is missing, expired or has used up its hits.
    #[error("Link not found")]
    NotFound,

    /// Link is password protected and the supplied password is missing or wrong.
    #[error("Password required")]
    PasswordRequired,

    /// The store already holds a record with this id.
    #[error("Duplicate link id: {0}")]
    DuplicateKey(String),

    /// No free id could be found within the retry budget.
    #[error("Failed to allocate a unique id after {attempts} attempts")]
    AllocationExhausted { attempts: usize },

    /// Transient store failure (timeout, pool exhaustion, lost connection).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The OS randomness source could not be read.
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// Non-transient store failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LinkError {
    /// Returns true for failures that are safe to retry at the store boundary.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<sqlx::Error> for LinkError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::WorkerCrashed => Self::StoreUnavailable(e.to_string()),
            sqlx::Error::RowNotFound => Self::NotFound,
            _ => match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    Self::DuplicateKey(db.constraint().unwrap_or("links_pkey").to_string())
                }
                _ => Self::Store(e.to_string()),
            },
        }
    }
}
