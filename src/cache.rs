//! TTL cache for fetched series
//!
//! One entry per dataset, keyed by name. A page render hits this instead of
//! the network: within the TTL window the stored table comes back untouched,
//! after expiry the producer runs again. Producer failures are never cached.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Clock abstraction so tests can drive expiry without sleeping.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> i64;
}

/// Wall clock used in production.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

struct Entry<T> {
    value: T,
    fetched_at: i64,
}

/// Memoizes async producers for a bounded time-to-live.
pub struct TtlCache<T> {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if it is younger than `ttl_secs`,
    /// otherwise run `producer` and store its result.
    ///
    /// The lock is not held across the await: two callers racing on an
    /// expired entry may both produce, and the last write wins. Keys are
    /// partitioned per dataset so there is no cross-dataset interference.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl_secs: i64,
        producer: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(key) {
                if now - entry.fetched_at < ttl_secs {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = producer().await?;
        // Stamp after production so a slow fetch does not eat into the TTL.
        let fetched_at = self.clock.now();

        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                fetched_at,
            },
        );

        Ok(value)
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
