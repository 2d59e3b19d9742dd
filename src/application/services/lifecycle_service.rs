//! Bulk removal of links that can no longer resolve.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;
use crate::domain::lifecycle::LifecyclePolicy;
use crate::domain::repositories::LinkRepository;

/// Service behind the scheduled sweep and its admin endpoints.
///
/// The sweep is idempotent: running it twice at the same `now` removes
/// nothing the second time.
pub struct LifecycleService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    policy: LifecyclePolicy,
}

impl<L: LinkRepository + ?Sized> LifecycleService<L> {
    pub fn new(repository: Arc<L>, policy: LifecyclePolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Records the sweep would remove at `now`, ordered by id.
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<LinkRecord>, LinkError> {
        let mut candidates: BTreeMap<String, LinkRecord> = self
            .repository
            .list_expired(now)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        if self.policy.sweeps_exhausted() {
            for record in self.repository.list_exhausted().await? {
                candidates.entry(record.id.clone()).or_insert(record);
            }
        }

        Ok(candidates
            .into_values()
            .filter(|r| self.policy.is_sweepable(r, now))
            .collect())
    }

    /// Deletes every record that is sweepable at `now`.
    ///
    /// Returns the removed ids, sorted. Each store batch is atomic; if the
    /// exhausted batch fails, the expired batch has already been committed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, LinkError> {
        let mut removed = self.repository.delete_expired(now).await?;

        if self.policy.sweeps_exhausted() {
            match self.repository.delete_exhausted().await {
                Ok(ids) => removed.extend(ids),
                Err(e) => {
                    warn!(
                        removed = removed.len(),
                        error = %e,
                        "Sweep removed expired links but failed on exhausted links"
                    );
                    return Err(e);
                }
            }
        }

        removed.sort();
        removed.dedup();

        metrics::counter!("links_swept_total").increment(removed.len() as u64);
        info!(removed = removed.len(), "Sweep finished");

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::SweepPolicy;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::persistence::MemoryLinkRepository;
    use chrono::Duration;

    fn record(id: &str) -> LinkRecord {
        LinkRecord {
            id: id.to_string(),
            destination: "https://example.com".to_string(),
            created_at: Utc::now(),
            self_destruct_at: None,
            max_hits: 0,
            hit_count: 0,
            owner_token: "owner".to_string(),
            password_hash: None,
        }
    }

    async fn seeded(now: DateTime<Utc>) -> Arc<MemoryLinkRepository> {
        let repo = Arc::new(MemoryLinkRepository::new());
        repo.insert(LinkRecord {
            self_destruct_at: Some(now - Duration::seconds(1)),
            ..record("expired")
        })
        .await
        .unwrap();
        repo.insert(LinkRecord {
            self_destruct_at: Some(now + Duration::hours(1)),
            ..record("future")
        })
        .await
        .unwrap();
        repo.insert(LinkRecord {
            max_hits: 1,
            ..record("limited")
        })
        .await
        .unwrap();
        repo.increment_hit("limited", now).await.unwrap();
        repo.insert(record("forever")).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_and_exhausted() {
        let now = Utc::now();
        let repo = seeded(now).await;
        let service = LifecycleService::new(repo.clone(), LifecyclePolicy::default());

        let removed = service.sweep_expired(now).await.unwrap();

        assert_eq!(removed, ["expired", "limited"]);
        assert_eq!(repo.len(), 2);
        assert!(service.sweep_expired(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_expired_only_keeps_exhausted() {
        let now = Utc::now();
        let repo = seeded(now).await;
        let service =
            LifecycleService::new(repo.clone(), LifecyclePolicy::new(SweepPolicy::ExpiredOnly));

        assert_eq!(service.sweep_expired(now).await.unwrap(), ["expired"]);
        assert!(repo.exists("limited").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_expired_matches_sweep() {
        let now = Utc::now();
        let repo = seeded(now).await;
        let service = LifecycleService::new(repo.clone(), LifecyclePolicy::default());

        let listed: Vec<String> = service
            .list_expired(now)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(listed, ["expired", "limited"]);
        assert_eq!(repo.len(), 4);
        assert_eq!(service.sweep_expired(now).await.unwrap(), listed);
    }

    #[tokio::test]
    async fn test_sweep_dedups_records_in_both_batches() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_expired()
            .times(1)
            .returning(|_| Ok(vec!["b".to_string(), "a".to_string()]));
        repo.expect_delete_exhausted()
            .times(1)
            .returning(|| Ok(vec!["a".to_string(), "c".to_string()]));

        let service = LifecycleService::new(Arc::new(repo), LifecyclePolicy::default());

        assert_eq!(service.sweep_expired(Utc::now()).await.unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_sweep_propagates_store_failure() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_expired()
            .times(1)
            .returning(|_| Err(LinkError::StoreUnavailable("timeout".to_string())));

        let service = LifecycleService::new(Arc::new(repo), LifecyclePolicy::default());

        assert!(matches!(
            service.sweep_expired(Utc::now()).await,
            Err(LinkError::StoreUnavailable(_))
        ));
    }
}
