//! Link creation, resolution and ownership service.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info};

use crate::application::services::auth_service::AuthService;
use crate::domain::allocator::IdAllocator;
use crate::domain::entities::{LinkRecord, NewLinkRecord};
use crate::domain::errors::LinkError;
use crate::domain::lifecycle::LifecyclePolicy;
use crate::domain::repositories::LinkRepository;
use crate::utils::destination::{host_of, validate_destination};
use crate::utils::id_generator::{IdGenerator, OWNER_TOKEN_LENGTH, random_sequence};

/// Input for [`LinkService::create_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub destination: String,
    /// Seconds until self-destruct; `None` or `0` never expires.
    pub self_destruct_seconds: Option<i64>,
    /// Hit limit; `None` or `0` is unlimited.
    pub max_hits: Option<i64>,
    /// Generated when absent.
    pub owner_token: Option<String>,
    pub password: Option<String>,
}

/// Deployment settings the service needs.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Public base URL short links are rendered under.
    pub service_url: String,
    /// Initial length of generated ids.
    pub id_length: usize,
}

/// Service for creating, resolving and deleting links.
///
/// Every lookup goes through the store's resolvability predicate, so expired
/// and exhausted links are indistinguishable from missing ones.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    allocator: IdAllocator<L>,
    auth: Arc<AuthService>,
    policy: LifecyclePolicy,
    settings: LinkSettings,
    service_host: String,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(
        repository: Arc<L>,
        generator: Arc<dyn IdGenerator>,
        auth: Arc<AuthService>,
        policy: LifecyclePolicy,
        settings: LinkSettings,
    ) -> Self {
        let service_host = host_of(&settings.service_url).unwrap_or_default();
        Self {
            allocator: IdAllocator::new(repository.clone(), generator),
            repository,
            auth,
            policy,
            settings,
            service_host,
        }
    }

    /// Validates the input, allocates an id and stores the new link.
    ///
    /// # Errors
    ///
    /// - [`LinkError::InvalidDestination`] / [`LinkError::InvalidMaxHits`] on bad input
    /// - [`LinkError::AllocationExhausted`] when no free id was found
    /// - store and entropy failures as-is
    pub async fn create_link(&self, input: CreateLink) -> Result<LinkRecord, LinkError> {
        let destination = validate_destination(&input.destination, &self.service_host)?;
        let max_hits = self.policy.max_hits(input.max_hits)?;

        let now = Utc::now().trunc_subsecs(0);
        let owner_token = match input.owner_token {
            Some(token) if !token.trim().is_empty() => token,
            _ => random_sequence(OWNER_TOKEN_LENGTH)?,
        };
        let password_hash = input
            .password
            .filter(|p| !p.is_empty())
            .map(|p| self.auth.hash_password(&p))
            .transpose()?;

        let new_link = NewLinkRecord {
            destination,
            created_at: now,
            self_destruct_at: self.policy.self_destruct_at(now, input.self_destruct_seconds),
            max_hits,
            owner_token,
            password_hash,
        };

        let record = self
            .allocator
            .reserve(self.settings.id_length, &new_link)
            .await?;

        metrics::counter!("links_created_total").increment(1);
        info!(
            id = %record.id,
            expires = record.self_destruct_at.is_some(),
            max_hits = record.max_hits,
            "Link created"
        );

        Ok(record)
    }

    /// Returns a resolvable link without counting a hit.
    pub async fn resolve_link(&self, id: &str) -> Result<LinkRecord, LinkError> {
        self.repository.get_unexpired(id, Utc::now()).await
    }

    /// Counts one hit, provided the link is still resolvable.
    ///
    /// The check and the increment happen in one store operation, so
    /// concurrent hits never push `hit_count` past `max_hits`.
    pub async fn record_hit(&self, id: &str) -> Result<LinkRecord, LinkError> {
        let record = self.repository.increment_hit(id, Utc::now()).await?;
        metrics::counter!("link_hits_total").increment(1);
        debug!(id, hit_count = record.hit_count, "Hit recorded");
        Ok(record)
    }

    /// Resolves a link for a visitor: password check, then hit.
    ///
    /// A wrong password does not consume a hit.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotFound`] if the link is not resolvable
    /// - [`LinkError::PasswordRequired`] if the password is missing or wrong
    pub async fn follow_link(
        &self,
        id: &str,
        password: Option<&str>,
    ) -> Result<LinkRecord, LinkError> {
        let record = self.resolve_link(id).await?;

        if let Some(hash) = record.password_hash.as_deref() {
            let supplied = password.unwrap_or_default();
            if !self.auth.verify_password(supplied, hash) {
                debug!(id, "Password check failed");
                return Err(LinkError::PasswordRequired);
            }
        }

        self.record_hit(id).await
    }

    /// All links created with `owner_token`, newest first.
    pub async fn list_owner_links(&self, owner_token: &str) -> Result<Vec<LinkRecord>, LinkError> {
        self.repository.list_by_owner(owner_token).await
    }

    /// Every stored link, newest first, including expired and exhausted ones.
    pub async fn list_all_links(&self) -> Result<Vec<LinkRecord>, LinkError> {
        self.repository.list_all().await
    }

    /// Deletes a link if `owner_token` created it.
    ///
    /// Returns `false` when the link is missing or owned by someone else.
    pub async fn delete_link(&self, id: &str, owner_token: &str) -> Result<bool, LinkError> {
        let deleted = self.repository.delete_by_owner(id, owner_token).await?;
        if deleted {
            info!(id, "Link deleted by owner");
        }
        Ok(deleted)
    }

    /// Returns an id free at the time of the call, without reserving it.
    pub async fn allocate_id(&self) -> Result<String, LinkError> {
        self.allocator.allocate(self.settings.id_length).await
    }

    /// Full short URL for an id.
    pub fn short_url(&self, id: &str) -> String {
        format!("{}/{}", self.settings.service_url.trim_end_matches('/'), id)
    }

    /// Checks the link store is reachable.
    pub async fn health_check(&self) -> Result<(), LinkError> {
        self.repository.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::persistence::MemoryLinkRepository;
    use crate::utils::id_generator::{MockIdGenerator, OsIdGenerator};
    use chrono::Duration;

    fn auth() -> Arc<AuthService> {
        Arc::new(AuthService::new("secret".to_string(), "admin"))
    }

    fn settings() -> LinkSettings {
        LinkSettings {
            service_url: "https://nolongr.vercel.app".to_string(),
            id_length: 2,
        }
    }

    fn memory_service() -> (Arc<MemoryLinkRepository>, LinkService<MemoryLinkRepository>) {
        let repo = Arc::new(MemoryLinkRepository::new());
        let service = LinkService::new(
            repo.clone(),
            Arc::new(OsIdGenerator),
            auth(),
            LifecyclePolicy::default(),
            settings(),
        );
        (repo, service)
    }

    fn create(destination: &str) -> CreateLink {
        CreateLink {
            destination: destination.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_link_uses_generated_id() {
        let mut generator = MockIdGenerator::new();
        generator
            .expect_generate()
            .withf(|len| *len == 2)
            .returning(|_| Ok("Xy".to_string()));

        let mut repo = MockLinkRepository::new();
        repo.expect_exists().times(1).returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|r| r.id == "Xy" && r.destination == "https://example.com" && r.hit_count == 0)
            .times(1)
            .returning(Ok);

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(generator),
            auth(),
            LifecyclePolicy::default(),
            settings(),
        );

        let record = service.create_link(create("https://example.com")).await.unwrap();

        assert_eq!(record.id, "Xy");
        assert_eq!(record.owner_token.len(), OWNER_TOKEN_LENGTH);
        assert_eq!(service.short_url(&record.id), "https://nolongr.vercel.app/Xy");
    }

    #[tokio::test]
    async fn test_create_link_rejects_self_reference_before_allocating() {
        let generator = MockIdGenerator::new();
        let repo = MockLinkRepository::new();

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(generator),
            auth(),
            LifecyclePolicy::default(),
            settings(),
        );

        let result = service
            .create_link(create("https://nolongr.vercel.app/ab"))
            .await;

        assert!(matches!(result, Err(LinkError::InvalidDestination(_))));
    }

    #[tokio::test]
    async fn test_create_link_rejects_negative_max_hits() {
        let (repo, service) = memory_service();

        let result = service
            .create_link(CreateLink {
                max_hits: Some(-1),
                ..create("https://example.com")
            })
            .await;

        assert_eq!(result, Err(LinkError::InvalidMaxHits(-1)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_create_link_keeps_supplied_owner_and_hashes_password() {
        let (_, service) = memory_service();

        let record = service
            .create_link(CreateLink {
                owner_token: Some("mine".to_string()),
                password: Some("pw".to_string()),
                self_destruct_seconds: Some(60),
                ..create("example.com")
            })
            .await
            .unwrap();

        assert_eq!(record.owner_token, "mine");
        let hash = record.password_hash.as_deref().unwrap();
        assert_ne!(hash, "pw");
        let ttl = record.self_destruct_at.unwrap() - record.created_at;
        assert_eq!(ttl, Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_max_hits_lifecycle() {
        let (_, service) = memory_service();
        let record = service
            .create_link(CreateLink {
                max_hits: Some(2),
                ..create("https://example.com")
            })
            .await
            .unwrap();

        assert_eq!(service.follow_link(&record.id, None).await.unwrap().hit_count, 1);
        assert_eq!(service.follow_link(&record.id, None).await.unwrap().hit_count, 2);
        assert_eq!(service.follow_link(&record.id, None).await, Err(LinkError::NotFound));
        assert_eq!(service.resolve_link(&record.id).await, Err(LinkError::NotFound));
    }

    #[tokio::test]
    async fn test_resolve_does_not_count_hits() {
        let (_, service) = memory_service();
        let record = service
            .create_link(CreateLink {
                max_hits: Some(1),
                ..create("https://example.com")
            })
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(service.resolve_link(&record.id).await.unwrap().hit_count, 0);
        }
    }

    #[tokio::test]
    async fn test_born_expired_link_is_not_resolvable() {
        let (repo, service) = memory_service();
        let record = service
            .create_link(CreateLink {
                self_destruct_seconds: Some(-5),
                ..create("https://example.com")
            })
            .await
            .unwrap();

        assert_eq!(service.resolve_link(&record.id).await, Err(LinkError::NotFound));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_consume_hit() {
        let (_, service) = memory_service();
        let record = service
            .create_link(CreateLink {
                max_hits: Some(1),
                password: Some("open sesame".to_string()),
                ..create("https://example.com")
            })
            .await
            .unwrap();

        assert_eq!(
            service.follow_link(&record.id, None).await,
            Err(LinkError::PasswordRequired)
        );
        assert_eq!(
            service.follow_link(&record.id, Some("nope")).await,
            Err(LinkError::PasswordRequired)
        );
        let hit = service
            .follow_link(&record.id, Some("open sesame"))
            .await
            .unwrap();
        assert_eq!(hit.hit_count, 1);
    }

    #[tokio::test]
    async fn test_owner_scoped_list_and_delete() {
        let (_, service) = memory_service();
        let owned = |dest: &str, owner: &str| CreateLink {
            owner_token: Some(owner.to_string()),
            ..create(dest)
        };

        let a = service.create_link(owned("a.com", "alice")).await.unwrap();
        service.create_link(owned("b.com", "alice")).await.unwrap();
        service.create_link(owned("c.com", "bob")).await.unwrap();

        assert_eq!(service.list_owner_links("alice").await.unwrap().len(), 2);
        assert!(!service.delete_link(&a.id, "bob").await.unwrap());
        assert!(service.delete_link(&a.id, "alice").await.unwrap());
        assert!(!service.delete_link(&a.id, "alice").await.unwrap());
        assert_eq!(service.list_owner_links("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_allocate_id_does_not_reserve() {
        let (repo, service) = memory_service();

        let id = service.allocate_id().await.unwrap();

        assert_eq!(id.len(), 2);
        assert!(repo.is_empty());
    }
}
