//! Timeout and retry guard applied to every database call.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, warn};

use crate::domain::entities::LinkRecord;
use crate::domain::errors::LinkError;

/// Delay before the single retry of a transient failure.
pub const RETRY_BACKOFF_MS: u64 = 50;

/// Runs a store operation with a bounded timeout, retrying once on
/// [`LinkError::StoreUnavailable`].
///
/// `action` is invoked once per attempt, so it must build a fresh query each
/// time. A timed-out attempt may still have committed, so only statements
/// whose repeat leaves the same outcome go through here; see
/// [`guarded_once`] and [`guarded_insert`] for the others.
pub async fn guarded<T, F, Fut>(op: &'static str, timeout: Duration, mut action: F) -> Result<T, LinkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let strategy = FixedInterval::from_millis(RETRY_BACKOFF_MS).take(1);

    RetryIf::spawn(
        strategy,
        || attempt(op, timeout, action()),
        |e: &LinkError| {
            let retry = e.is_transient();
            if retry {
                warn!(op, error = %e, "Store call failed, retrying");
            }
            retry
        },
    )
    .await
}

/// Runs a store operation with a bounded timeout and no retry.
///
/// For writes whose repeat would be observed differently from the first
/// attempt, such as a hit increment or an owner delete.
pub async fn guarded_once<T, Fut>(op: &'static str, timeout: Duration, action: Fut) -> Result<T, LinkError>
where
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    attempt(op, timeout, action).await
}

/// Runs a conditional insert (`ON CONFLICT DO NOTHING ... RETURNING`) under
/// [`guarded`], telling our own committed write apart from a real conflict.
///
/// When the insert reports a conflict, `fetch` reads the stored row. If it is
/// exactly `record`, an earlier attempt committed before timing out and the
/// insert succeeded. Otherwise the id belongs to someone else.
pub async fn guarded_insert<R, F, Fut, G, GFut>(
    timeout: Duration,
    record: &LinkRecord,
    action: F,
    fetch: G,
) -> Result<LinkRecord, LinkError>
where
    R: Into<LinkRecord>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<R>, sqlx::Error>>,
    G: FnOnce() -> GFut,
    GFut: Future<Output = Result<LinkRecord, LinkError>>,
{
    if let Some(row) = guarded("insert", timeout, action).await? {
        return Ok(row.into());
    }

    match fetch().await {
        Ok(stored) if stored == *record => {
            debug!(id = %record.id, "Insert committed before a retry, keeping it");
            Ok(stored)
        }
        Ok(_) | Err(LinkError::NotFound) => Err(LinkError::DuplicateKey(record.id.clone())),
        Err(e) => Err(e),
    }
}

async fn attempt<T, Fut>(op: &'static str, timeout: Duration, action: Fut) -> Result<T, LinkError>
where
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, action).await {
        Ok(result) => result.map_err(LinkError::from),
        Err(_) => Err(LinkError::StoreUnavailable(format!(
            "{op} timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
