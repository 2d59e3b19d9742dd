//! Lifecycle policy for self-destructing and hit-limited links.
//!
//! Computes expiry at creation, decides resolvability at lookup, and tells
//! the sweep which records are eligible for removal.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;

/// Which non-resolvable records the sweep removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Only records whose self-destruct time has passed.
    ExpiredOnly,
    /// Time-expired records and records whose hit limit is used up.
    #[default]
    ExpiredAndExhausted,
}

/// Largest self-destruct offset accepted in either direction (100 years).
///
/// Keeps computed times well inside the range a `TIMESTAMPTZ` column stores.
pub const MAX_SELF_DESTRUCT_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

impl SweepPolicy {
    /// Maps the `SWEEP_EXHAUSTED` flag onto a policy.
    pub fn from_sweep_exhausted(sweep_exhausted: bool) -> Self {
        if sweep_exhausted {
            Self::ExpiredAndExhausted
        } else {
            Self::ExpiredOnly
        }
    }
}

/// Stateless lifecycle rules shared by the services.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecyclePolicy {
    pub sweep: SweepPolicy,
}

impl LifecyclePolicy {
    pub fn new(sweep: SweepPolicy) -> Self {
        Self { sweep }
    }

    /// Computes the absolute self-destruct time for a link created at `now`.
    ///
    /// `None` and `Some(0)` both mean "never expires". A negative duration
    /// yields a time in the past, so the link is born expired. Offsets beyond
    /// [`MAX_SELF_DESTRUCT_SECONDS`] are clamped to it. The result is
    /// truncated to whole seconds to match [`format_timestamp`].
    pub fn self_destruct_at(
        &self,
        now: DateTime<Utc>,
        self_destruct_seconds: Option<i64>,
    ) -> Option<DateTime<Utc>> {
        match self_destruct_seconds {
            None | Some(0) => None,
            Some(seconds) => {
                let seconds = seconds.clamp(-MAX_SELF_DESTRUCT_SECONDS, MAX_SELF_DESTRUCT_SECONDS);
                Some((now + Duration::seconds(seconds)).trunc_subsecs(0))
            }
        }
    }

    /// Normalizes the hit limit supplied at creation; absent means unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidMaxHits`] for a negative limit.
    pub fn max_hits(&self, max_hits: Option<i64>) -> Result<i64, LinkError> {
        match max_hits {
            None => Ok(0),
            Some(n) if n < 0 => Err(LinkError::InvalidMaxHits(n)),
            Some(n) => Ok(n),
        }
    }

    /// Returns true if the record may be followed at `now`.
    pub fn is_resolvable(&self, record: &LinkRecord, now: DateTime<Utc>) -> bool {
        record.is_resolvable_at(now)
    }

    /// Returns true if the sweep should remove this record at `now`.
    pub fn is_sweepable(&self, record: &LinkRecord, now: DateTime<Utc>) -> bool {
        match self.sweep {
            SweepPolicy::ExpiredOnly => record.is_expired_at(now),
            SweepPolicy::ExpiredAndExhausted => record.is_expired_at(now) || record.is_exhausted(),
        }
    }

    /// Returns true if the sweep also removes hit-exhausted records.
    pub fn sweeps_exhausted(&self) -> bool {
        self.sweep == SweepPolicy::ExpiredAndExhausted
    }
}

/// Renders a timestamp in the fixed UTC form `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::milliseconds(750)
    }

    fn record(self_destruct_at: Option<DateTime<Utc>>, max_hits: i64, hit_count: i64) -> LinkRecord {
        LinkRecord {
            id: "ab".to_string(),
            destination: "https://example.com".to_string(),
            created_at: fixed_now(),
            self_destruct_at,
            max_hits,
            hit_count,
            owner_token: "owner".to_string(),
            password_hash: None,
        }
    }

    #[test]
    fn test_no_duration_means_no_expiry() {
        let policy = LifecyclePolicy::default();
        assert_eq!(policy.self_destruct_at(fixed_now(), None), None);
        assert_eq!(policy.self_destruct_at(fixed_now(), Some(0)), None);
    }

    #[test]
    fn test_duration_added_and_truncated() {
        let policy = LifecyclePolicy::default();
        let at = policy.self_destruct_at(fixed_now(), Some(60)).unwrap();
        assert_eq!(format_timestamp(at), "2024-03-01T12:01:00Z");
    }

    #[test]
    fn test_negative_duration_is_already_expired() {
        let policy = LifecyclePolicy::default();
        let now = fixed_now();
        let at = policy.self_destruct_at(now, Some(-1));
        let link = record(at, 0, 0);
        assert!(!policy.is_resolvable(&link, now));
    }

    #[test]
    fn test_huge_duration_is_clamped() {
        let policy = LifecyclePolicy::default();
        let now = fixed_now();
        let bound = Duration::seconds(MAX_SELF_DESTRUCT_SECONDS);

        let late = policy.self_destruct_at(now, Some(i64::MAX)).unwrap();
        assert_eq!(late, (now + bound).trunc_subsecs(0));

        let early = policy.self_destruct_at(now, Some(i64::MIN)).unwrap();
        assert_eq!(early, (now - bound).trunc_subsecs(0));
        assert!(early.year() > 1900);
    }

    #[test]
    fn test_max_hits_normalization() {
        let policy = LifecyclePolicy::default();
        assert_eq!(policy.max_hits(None), Ok(0));
        assert_eq!(policy.max_hits(Some(0)), Ok(0));
        assert_eq!(policy.max_hits(Some(3)), Ok(3));
        assert_eq!(policy.max_hits(Some(-2)), Err(LinkError::InvalidMaxHits(-2)));
    }

    #[test]
    fn test_sweepable_depends_on_policy() {
        let now = fixed_now();
        let exhausted = record(None, 2, 2);
        let expired = record(Some(now - Duration::seconds(5)), 0, 0);
        let unlimited = record(None, 0, 99);

        let only_expired = LifecyclePolicy::new(SweepPolicy::ExpiredOnly);
        assert!(only_expired.is_sweepable(&expired, now));
        assert!(!only_expired.is_sweepable(&exhausted, now));
        assert!(!only_expired.is_sweepable(&unlimited, now));

        let both = LifecyclePolicy::new(SweepPolicy::ExpiredAndExhausted);
        assert!(both.is_sweepable(&expired, now));
        assert!(both.is_sweepable(&exhausted, now));
        assert!(!both.is_sweepable(&unlimited, now));
    }

    #[test]
    fn test_format_timestamp_fixed_width() {
        assert_eq!(format_timestamp(fixed_now()), "2024-03-01T12:00:00Z");
    }
}
