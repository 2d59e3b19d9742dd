//! Collision-aware identifier allocation.
//!
//! Candidates are generated at the requested length and checked against the
//! store. After [`COLLISION_THRESHOLD`] collisions the allocation escalates to
//! one extra character for the rest of the call, then gives up after another
//! [`ESCALATED_BUDGET`] collisions.
//!
//! The existence check only avoids pointless inserts. Uniqueness is decided by
//! the store's conditional insert in [`IdAllocator::reserve`]; a lost insert
//! race counts as a collision like any other.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::{LinkRecord, NewLinkRecord};
use crate::domain::errors::LinkError;
use crate::domain::repositories::LinkRepository;
use crate::utils::id_generator::IdGenerator;

/// Collisions tolerated at the initial length before escalating.
pub const COLLISION_THRESHOLD: usize = 10;

/// Collisions tolerated at the escalated length before giving up.
pub const ESCALATED_BUDGET: usize = 10;

/// Allocates identifiers that are free in the link store.
pub struct IdAllocator<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    generator: Arc<dyn IdGenerator>,
}

impl<L: LinkRepository + ?Sized> IdAllocator<L> {
    pub fn new(repository: Arc<L>, generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            repository,
            generator,
        }
    }

    /// Returns an id that was free at the time of the check.
    ///
    /// Nothing is reserved, so a concurrent creation may still take the id.
    ///
    /// # Errors
    ///
    /// - [`LinkError::AllocationExhausted`] when both retry budgets are spent
    /// - [`LinkError::EntropyUnavailable`] when the generator fails
    /// - [`LinkError::StoreUnavailable`] when the existence check times out
    pub async fn allocate(&self, initial_length: usize) -> Result<String, LinkError> {
        let mut attempts = Attempts::new(initial_length);

        loop {
            let candidate = self.generator.generate(attempts.length)?;
            if !self.repository.exists(&candidate).await? {
                return Ok(candidate);
            }
            attempts.record_collision(&candidate)?;
        }
    }

    /// Allocates an id and inserts `new_link` under it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::allocate`], plus any non-duplicate insert failure.
    pub async fn reserve(
        &self,
        initial_length: usize,
        new_link: &NewLinkRecord,
    ) -> Result<LinkRecord, LinkError> {
        let mut attempts = Attempts::new(initial_length);

        loop {
            let candidate = self.generator.generate(attempts.length)?;

            if self.repository.exists(&candidate).await? {
                attempts.record_collision(&candidate)?;
                continue;
            }

            match self.repository.insert(new_link.with_id(candidate.clone())).await {
                Ok(record) => return Ok(record),
                Err(LinkError::DuplicateKey(_)) => {
                    debug!(id = %candidate, "Lost insert race, retrying");
                    attempts.record_collision(&candidate)?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Retry bookkeeping for one allocation call.
#[derive(Debug)]
struct Attempts {
    initial_length: usize,
    length: usize,
    collisions: usize,
    total: usize,
    escalated: bool,
}

impl Attempts {
    fn new(initial_length: usize) -> Self {
        Self {
            initial_length,
            length: initial_length,
            collisions: 0,
            total: 0,
            escalated: false,
        }
    }

    fn record_collision(&mut self, candidate: &str) -> Result<(), LinkError> {
        self.total += 1;
        self.collisions += 1;
        metrics::counter!("id_collisions_total").increment(1);
        debug!(id = %candidate, length = self.length, "Id collision");

        if !self.escalated && self.collisions > COLLISION_THRESHOLD {
            warn!(
                initial_length = self.initial_length,
                collisions = self.collisions,
                "Id space under pressure, escalating id length; consider raising ID_LENGTH"
            );
            metrics::counter!("id_length_escalations_total").increment(1);
            self.escalated = true;
            self.length = self.initial_length + 1;
            self.collisions = 0;
        } else if self.escalated && self.collisions >= ESCALATED_BUDGET {
            warn!(attempts = self.total, "Id allocation exhausted");
            return Err(LinkError::AllocationExhausted {
                attempts: self.total,
            });
        }

        Ok(())
    }
}
