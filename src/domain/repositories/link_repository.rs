//! Repository trait for link record storage.

use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage contract for link records.
///
/// The store is the authoritative guard for id uniqueness and evaluates the
/// resolvability predicate itself, so that lookups and hit increments never
/// race a concurrent sweep through a client-side filter.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Errors
///
/// Every method may fail with [`LinkError::StoreUnavailable`] when the backend
/// does not answer within its timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Returns true if a record with this id exists, expired or not.
    async fn exists(&self, id: &str) -> Result<bool, LinkError>;

    /// Inserts a new record if its id is free.
    ///
    /// Repeating the insert of a record that is already stored unchanged
    /// succeeds and returns it, so a retry after a lost reply is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::DuplicateKey`] if the id holds any other record.
    async fn insert(&self, record: LinkRecord) -> Result<LinkRecord, LinkError>;

    /// Fetches a record regardless of its lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no record has this id.
    async fn get(&self, id: &str) -> Result<LinkRecord, LinkError>;

    /// Fetches a record only if it is resolvable at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if the record is missing, expired or exhausted.
    async fn get_unexpired(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError>;

    /// Lists every record created under an owner token, newest first.
    async fn list_by_owner(&self, owner_token: &str) -> Result<Vec<LinkRecord>, LinkError>;

    /// Lists every record in the store, newest first, resolvable or not.
    async fn list_all(&self) -> Result<Vec<LinkRecord>, LinkError>;

    /// Lists records whose self-destruct time has passed at `now`.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<LinkRecord>, LinkError>;

    /// Lists records whose hit limit has been reached.
    async fn list_exhausted(&self) -> Result<Vec<LinkRecord>, LinkError>;

    /// Increments the hit counter of a record that is resolvable at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if the record is missing or not resolvable;
    /// the counter is left untouched in that case.
    async fn increment_hit(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError>;

    /// Deletes a record if it belongs to `owner_token`.
    ///
    /// Returns `Ok(false)` for both a missing id and an owner mismatch.
    async fn delete_by_owner(&self, id: &str, owner_token: &str) -> Result<bool, LinkError>;

    /// Deletes every record whose self-destruct time has passed at `now`.
    ///
    /// Returns the removed ids.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, LinkError>;

    /// Deletes every record whose hit limit has been reached.
    ///
    /// Returns the removed ids.
    async fn delete_exhausted(&self) -> Result<Vec<String>, LinkError>;

    /// Checks that the backend answers.
    async fn ping(&self) -> Result<(), LinkError>;
}
