//! In-process implementation of link repository.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;
use crate::domain::repositories::LinkRepository;

/// Link store kept in a mutex-guarded map.
///
/// Each operation takes the lock, does its work and releases it before
/// returning, so no lock is held across an await point. Insert is an atomic
/// insert-if-absent, which makes this store a valid uniqueness oracle.
///
/// Used for local development (`STORAGE_BACKEND=memory`) and tests.
#[derive(Debug, Default)]
pub struct MemoryLinkRepository {
    links: Mutex<HashMap<String, LinkRecord>>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, resolvable or not.
    pub fn len(&self) -> usize {
        self.links.lock().map(|links| links.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, LinkRecord>>, LinkError> {
        self.links
            .lock()
            .map_err(|_| LinkError::Store("memory store lock poisoned".to_string()))
    }
}

fn sorted_newest_first(mut records: Vec<LinkRecord>) -> Vec<LinkRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    records
}

fn remove_where(
    links: &mut HashMap<String, LinkRecord>,
    predicate: impl Fn(&LinkRecord) -> bool,
) -> Vec<String> {
    let mut removed: Vec<String> = links
        .values()
        .filter(|r| predicate(r))
        .map(|r| r.id.clone())
        .collect();
    removed.sort();

    for id in &removed {
        links.remove(id);
    }

    removed
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn exists(&self, id: &str) -> Result<bool, LinkError> {
        Ok(self.lock()?.contains_key(id))
    }

    async fn insert(&self, record: LinkRecord) -> Result<LinkRecord, LinkError> {
        let stored = LinkRecord {
            hit_count: 0,
            ..record
        };
        let mut links = self.lock()?;
        match links.entry(stored.id.clone()) {
            Entry::Occupied(existing) if *existing.get() == stored => Ok(stored),
            Entry::Occupied(_) => Err(LinkError::DuplicateKey(stored.id)),
            Entry::Vacant(slot) => {
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<LinkRecord, LinkError> {
        self.lock()?.get(id).cloned().ok_or(LinkError::NotFound)
    }

    async fn get_unexpired(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError> {
        self.lock()?
            .get(id)
            .filter(|r| r.is_resolvable_at(now))
            .cloned()
            .ok_or(LinkError::NotFound)
    }

    async fn list_by_owner(&self, owner_token: &str) -> Result<Vec<LinkRecord>, LinkError> {
        let records = self
            .lock()?
            .values()
            .filter(|r| r.owner_token == owner_token)
            .cloned()
            .collect();
        Ok(sorted_newest_first(records))
    }

    async fn list_all(&self) -> Result<Vec<LinkRecord>, LinkError> {
        let records = self.lock()?.values().cloned().collect();
        Ok(sorted_newest_first(records))
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<LinkRecord>, LinkError> {
        let mut records: Vec<LinkRecord> = self
            .lock()?
            .values()
            .filter(|r| r.is_expired_at(now))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.self_destruct_at.cmp(&b.self_destruct_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn list_exhausted(&self) -> Result<Vec<LinkRecord>, LinkError> {
        let mut records: Vec<LinkRecord> = self
            .lock()?
            .values()
            .filter(|r| r.is_exhausted())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn increment_hit(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError> {
        let mut links = self.lock()?;
        match links.get_mut(id) {
            Some(record) if record.is_resolvable_at(now) => {
                record.hit_count += 1;
                Ok(record.clone())
            }
            _ => Err(LinkError::NotFound),
        }
    }

    async fn delete_by_owner(&self, id: &str, owner_token: &str) -> Result<bool, LinkError> {
        let mut links = self.lock()?;
        let owned = links.get(id).is_some_and(|r| r.owner_token == owner_token);
        if owned {
            links.remove(id);
        }
        Ok(owned)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, LinkError> {
        let mut links = self.lock()?;
        Ok(remove_where(&mut links, |r| r.is_expired_at(now)))
    }

    async fn delete_exhausted(&self) -> Result<Vec<String>, LinkError> {
        let mut links = self.lock()?;
        Ok(remove_where(&mut links, LinkRecord::is_exhausted))
    }

    async fn ping(&self) -> Result<(), LinkError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, owner: &str) -> LinkRecord {
        LinkRecord {
            id: id.to_string(),
            destination: "https://example.com".to_string(),
            created_at: Utc::now(),
            self_destruct_at: None,
            max_hits: 0,
            hit_count: 0,
            owner_token: owner.to_string(),
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let repo = MemoryLinkRepository::new();
        repo.insert(record("ab", "o1")).await.unwrap();

        let err = repo.insert(record("ab", "o2")).await.unwrap_err();

        assert_eq!(err, LinkError::DuplicateKey("ab".to_string()));
        assert_eq!(repo.get("ab").await.unwrap().owner_token, "o1");
    }

    #[tokio::test]
    async fn test_insert_of_identical_record_is_idempotent() {
        let repo = MemoryLinkRepository::new();
        let link = record("ab", "o1");

        repo.insert(link.clone()).await.unwrap();
        assert_eq!(repo.insert(link.clone()).await, Ok(link.clone()));
        assert_eq!(repo.len(), 1);

        repo.increment_hit("ab", Utc::now()).await.unwrap();
        assert_eq!(
            repo.insert(link).await,
            Err(LinkError::DuplicateKey("ab".to_string()))
        );
    }

    #[tokio::test]
    async fn test_ids_are_case_sensitive() {
        let repo = MemoryLinkRepository::new();
        repo.insert(record("ab", "o")).await.unwrap();
        repo.insert(record("AB", "o")).await.unwrap();
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_increment_hit_stops_at_limit() {
        let repo = MemoryLinkRepository::new();
        repo.insert(LinkRecord {
            max_hits: 2,
            ..record("ab", "o")
        })
        .await
        .unwrap();
        let now = Utc::now();

        assert_eq!(repo.increment_hit("ab", now).await.unwrap().hit_count, 1);
        assert_eq!(repo.increment_hit("ab", now).await.unwrap().hit_count, 2);
        assert_eq!(repo.increment_hit("ab", now).await, Err(LinkError::NotFound));
        assert_eq!(repo.get("ab").await.unwrap().hit_count, 2);
    }

    #[tokio::test]
    async fn test_get_unexpired_hides_expired_record() {
        let repo = MemoryLinkRepository::new();
        let now = Utc::now();
        repo.insert(LinkRecord {
            self_destruct_at: Some(now - Duration::seconds(1)),
            ..record("ab", "o")
        })
        .await
        .unwrap();

        assert_eq!(repo.get_unexpired("ab", now).await, Err(LinkError::NotFound));
        assert!(repo.get("ab").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_owner_checks_token() {
        let repo = MemoryLinkRepository::new();
        repo.insert(record("ab", "owner")).await.unwrap();

        assert!(!repo.delete_by_owner("ab", "intruder").await.unwrap());
        assert!(repo.exists("ab").await.unwrap());
        assert!(!repo.delete_by_owner("zz", "owner").await.unwrap());
        assert!(repo.delete_by_owner("ab", "owner").await.unwrap());
        assert!(!repo.exists("ab").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_returns_removed_ids() {
        let repo = MemoryLinkRepository::new();
        let now = Utc::now();
        repo.insert(LinkRecord {
            self_destruct_at: Some(now - Duration::seconds(10)),
            ..record("b", "o")
        })
        .await
        .unwrap();
        repo.insert(LinkRecord {
            self_destruct_at: Some(now - Duration::seconds(5)),
            ..record("a", "o")
        })
        .await
        .unwrap();
        repo.insert(LinkRecord {
            self_destruct_at: Some(now + Duration::hours(1)),
            ..record("c", "o")
        })
        .await
        .unwrap();

        let expired = repo.list_expired(now).await.unwrap();
        assert_eq!(expired.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["b", "a"]);

        assert_eq!(repo.delete_expired(now).await.unwrap(), ["a", "b"]);
        assert!(repo.delete_expired(now).await.unwrap().is_empty());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_owner_scopes_results() {
        let repo = MemoryLinkRepository::new();
        repo.insert(record("a1", "alice")).await.unwrap();
        repo.insert(record("a2", "alice")).await.unwrap();
        repo.insert(record("b1", "bob")).await.unwrap();

        let links = repo.list_by_owner("alice").await.unwrap();

        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.owner_token == "alice"));
    }

    #[tokio::test]
    async fn test_list_all_includes_every_owner_and_state() {
        let repo = MemoryLinkRepository::new();
        let now = Utc::now();
        repo.insert(LinkRecord {
            created_at: now - chrono::Duration::minutes(1),
            ..record("old", "alice")
        })
        .await
        .unwrap();
        repo.insert(LinkRecord {
            created_at: now,
            self_destruct_at: Some(now - chrono::Duration::seconds(1)),
            ..record("new", "bob")
        })
        .await
        .unwrap();

        let ids: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|l| l.id).collect();

        assert_eq!(ids, ["new", "old"]);
    }
}
