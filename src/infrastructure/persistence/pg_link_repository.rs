//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::store_call::{guarded, guarded_insert, guarded_once};
use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;
use crate::domain::repositories::LinkRepository;

/// Row shape shared by every query returning full records.
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: String,
    destination: String,
    created_at: DateTime<Utc>,
    self_destruct_at: Option<DateTime<Utc>>,
    max_hits: i64,
    hit_count: i64,
    owner_token: String,
    password_hash: Option<String>,
}

impl From<LinkRow> for LinkRecord {
    fn from(r: LinkRow) -> Self {
        Self {
            id: r.id,
            destination: r.destination,
            created_at: r.created_at,
            self_destruct_at: r.self_destruct_at,
            max_hits: r.max_hits,
            hit_count: r.hit_count,
            owner_token: r.owner_token,
            password_hash: r.password_hash,
        }
    }
}

/// PostgreSQL repository for link records.
///
/// Uniqueness rests on the `links` primary key: inserts use
/// `ON CONFLICT DO NOTHING` and report an empty result as a duplicate unless
/// the stored row is the one being inserted. Resolvability is evaluated in
/// the `WHERE` clause of lookups and hit updates, never on fetched rows.
///
/// Hit increments and owner deletes are not retried after a timeout.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
    timeout: Duration,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    ///
    /// `timeout` bounds each individual statement.
    pub fn new(pool: Arc<PgPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn exists(&self, id: &str) -> Result<bool, LinkError> {
        guarded("exists", self.timeout, || {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM links WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool.as_ref())
        })
        .await
    }

    async fn insert(&self, record: LinkRecord) -> Result<LinkRecord, LinkError> {
        // Stored form, so a retried insert can recognize its own row.
        let record = LinkRecord {
            created_at: record.created_at.trunc_subsecs(6),
            self_destruct_at: record.self_destruct_at.map(|at| at.trunc_subsecs(6)),
            hit_count: 0,
            ..record
        };

        guarded_insert(
            self.timeout,
            &record,
            || {
                sqlx::query_as::<_, LinkRow>(
                    r#"
                    INSERT INTO links
                        (id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash)
                    VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
                    ON CONFLICT (id) DO NOTHING
                    RETURNING id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                    "#,
                )
                .bind(&record.id)
                .bind(&record.destination)
                .bind(record.created_at)
                .bind(record.self_destruct_at)
                .bind(record.max_hits)
                .bind(&record.owner_token)
                .bind(&record.password_hash)
                .fetch_optional(self.pool.as_ref())
            },
            || self.get(&record.id),
        )
        .await
    }

    async fn get(&self, id: &str) -> Result<LinkRecord, LinkError> {
        let row = guarded("get", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(self.pool.as_ref())
        })
        .await?;

        row.map(LinkRecord::from).ok_or(LinkError::NotFound)
    }

    async fn get_unexpired(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError> {
        let row = guarded("get_unexpired", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                WHERE id = $1
                  AND (self_destruct_at IS NULL OR self_destruct_at > $2)
                  AND (max_hits = 0 OR hit_count < max_hits)
                "#,
            )
            .bind(id)
            .bind(now)
            .fetch_optional(self.pool.as_ref())
        })
        .await?;

        row.map(LinkRecord::from).ok_or(LinkError::NotFound)
    }

    async fn list_by_owner(&self, owner_token: &str) -> Result<Vec<LinkRecord>, LinkError> {
        let rows = guarded("list_by_owner", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                WHERE owner_token = $1
                ORDER BY created_at DESC, id
                "#,
            )
            .bind(owner_token)
            .fetch_all(self.pool.as_ref())
        })
        .await?;

        Ok(rows.into_iter().map(LinkRecord::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<LinkRecord>, LinkError> {
        let rows = guarded("list_all", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                ORDER BY created_at DESC, id
                "#,
            )
            .fetch_all(self.pool.as_ref())
        })
        .await?;

        Ok(rows.into_iter().map(LinkRecord::from).collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<LinkRecord>, LinkError> {
        let rows = guarded("list_expired", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                WHERE self_destruct_at IS NOT NULL AND self_destruct_at <= $1
                ORDER BY self_destruct_at, id
                "#,
            )
            .bind(now)
            .fetch_all(self.pool.as_ref())
        })
        .await?;

        Ok(rows.into_iter().map(LinkRecord::from).collect())
    }

    async fn list_exhausted(&self) -> Result<Vec<LinkRecord>, LinkError> {
        let rows = guarded("list_exhausted", self.timeout, || {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                FROM links
                WHERE max_hits > 0 AND hit_count >= max_hits
                ORDER BY created_at, id
                "#,
            )
            .fetch_all(self.pool.as_ref())
        })
        .await?;

        Ok(rows.into_iter().map(LinkRecord::from).collect())
    }

    async fn increment_hit(&self, id: &str, now: DateTime<Utc>) -> Result<LinkRecord, LinkError> {
        let row = guarded_once(
            "increment_hit",
            self.timeout,
            sqlx::query_as::<_, LinkRow>(
                r#"
                UPDATE links
                SET hit_count = hit_count + 1
                WHERE id = $1
                  AND (self_destruct_at IS NULL OR self_destruct_at > $2)
                  AND (max_hits = 0 OR hit_count < max_hits)
                RETURNING id, destination, created_at, self_destruct_at, max_hits, hit_count, owner_token, password_hash
                "#,
            )
            .bind(id)
            .bind(now)
            .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        row.map(LinkRecord::from).ok_or(LinkError::NotFound)
    }

    async fn delete_by_owner(&self, id: &str, owner_token: &str) -> Result<bool, LinkError> {
        let result = guarded_once(
            "delete_by_owner",
            self.timeout,
            sqlx::query("DELETE FROM links WHERE id = $1 AND owner_token = $2")
                .bind(id)
                .bind(owner_token)
                .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>, LinkError> {
        guarded("delete_expired", self.timeout, || {
            sqlx::query_scalar::<_, String>(
                r#"
                DELETE FROM links
                WHERE self_destruct_at IS NOT NULL AND self_destruct_at <= $1
                RETURNING id
                "#,
            )
            .bind(now)
            .fetch_all(self.pool.as_ref())
        })
        .await
    }

    async fn delete_exhausted(&self) -> Result<Vec<String>, LinkError> {
        guarded("delete_exhausted", self.timeout, || {
            sqlx::query_scalar::<_, String>(
                "DELETE FROM links WHERE max_hits > 0 AND hit_count >= max_hits RETURNING id",
            )
            .fetch_all(self.pool.as_ref())
        })
        .await
    }

    async fn ping(&self) -> Result<(), LinkError> {
        guarded("ping", self.timeout, || {
            sqlx::query("SELECT 1").execute(self.pool.as_ref())
        })
        .await
        .map(|_| ())
    }
}
