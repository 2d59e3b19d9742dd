//! Link record entity representing a shortened, possibly self-destructing URL.

use chrono::{DateTime, Utc};

/// A persisted short link.
///
/// `max_hits == 0` means the link never runs out of hits. A missing
/// `self_destruct_at` means the link never expires by time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: String,
    pub destination: String,
    pub created_at: DateTime<Utc>,
    pub self_destruct_at: Option<DateTime<Utc>>,
    pub max_hits: i64,
    pub hit_count: i64,
    pub owner_token: String,
    pub password_hash: Option<String>,
}

impl LinkRecord {
    /// Returns true if the link has a time limit that has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.self_destruct_at.is_some_and(|at| at <= now)
    }

    /// Returns true if the link has a hit limit and has used it up.
    pub fn is_exhausted(&self) -> bool {
        self.max_hits > 0 && self.hit_count >= self.max_hits
    }

    /// Returns true if the link can still be followed at `now`.
    pub fn is_resolvable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_exhausted()
    }

    /// Returns true if following the link requires a password.
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Input data for inserting a new link record.
///
/// The id is assigned by the allocator; the counters start at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLinkRecord {
    pub destination: String,
    pub created_at: DateTime<Utc>,
    pub self_destruct_at: Option<DateTime<Utc>>,
    pub max_hits: i64,
    pub owner_token: String,
    pub password_hash: Option<String>,
}

impl NewLinkRecord {
    /// Binds this input to an allocated id, producing the record to insert.
    pub fn with_id(&self, id: String) -> LinkRecord {
        LinkRecord {
            id,
            destination: self.destination.clone(),
            created_at: self.created_at,
            self_destruct_at: self.self_destruct_at,
            max_hits: self.max_hits,
            hit_count: 0,
            owner_token: self.owner_token.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}
