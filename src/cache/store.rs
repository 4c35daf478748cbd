//! Single-slot, process-local cache for the breach feed
//!
//! Provides a `CacheStore` holding at most one payload together with the time
//! it was fetched. Freshness is computed lazily on every read; nothing is ever
//! evicted, so an expired payload stays available as a fallback.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::data::BreachRecord;

/// The payload and its fetch time, always replaced together
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached records, already sorted
    data: Arc<Vec<BreachRecord>>,
    /// When the records were fetched from upstream
    cached_at: DateTime<Utc>,
}

/// Result of reading from the cache, including freshness metadata
#[derive(Debug, Clone)]
pub struct CachedData {
    /// The cached records
    pub data: Arc<Vec<BreachRecord>>,
    /// When the records were fetched
    pub cached_at: DateTime<Utc>,
    /// Whole seconds elapsed since `cached_at`
    pub age_seconds: u64,
    /// Whether the entry is older than the TTL
    pub is_expired: bool,
}

/// Holds the most recent successful upstream fetch
///
/// The `(data, cached_at)` pair sits behind one lock, so readers never see a
/// payload paired with another payload's timestamp. Concurrent `replace` calls
/// are last-writer-wins.
pub struct CacheStore {
    entry: RwLock<Option<CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Creates an empty store using the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates an empty store with a custom clock
    ///
    /// Useful for testing freshness without sleeping.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns `true` iff a payload is present and younger than the TTL
    pub fn is_fresh(&self) -> bool {
        self.read().is_some_and(|cached| !cached.is_expired)
    }

    /// Reads the cached payload, fresh or not
    ///
    /// Returns `None` only if no fetch has ever succeeded.
    pub fn read(&self) -> Option<CachedData> {
        let entry = self
            .entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;

        let elapsed = (self.clock.now() - entry.cached_at)
            .to_std()
            .unwrap_or_default();

        Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            age_seconds: elapsed.as_secs(),
            is_expired: elapsed >= self.ttl,
        })
    }

    /// Atomically stores `data` stamped with the current time
    ///
    /// Returns the shared handle now held by the cache.
    pub fn replace(&self, data: Vec<BreachRecord>) -> Arc<Vec<BreachRecord>> {
        let data = Arc::new(data);
        let entry = CacheEntry {
            data: data.clone(),
            cached_at: self.clock.now(),
        };
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        data
    }

    /// Whether any payload, fresh or stale, is held
    pub fn has_payload(&self) -> bool {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("ttl", &self.ttl)
            .field("populated", &self.has_payload())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use serde_json::json;
    use std::thread;

    fn create_test_cache(ttl_secs: u64) -> (CacheStore, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 7, 15, 10, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = CacheStore::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    fn records(tag: &str) -> Vec<BreachRecord> {
        vec![BreachRecord(json!({ "Name": tag, "ModifiedDate": "2024-01-01" }))]
    }

    #[test]
    fn test_empty_store_is_not_fresh_and_reads_none() {
        let (cache, _clock) = create_test_cache(1800);

        assert!(!cache.is_fresh());
        assert!(cache.read().is_none());
        assert!(!cache.has_payload());
    }

    #[test]
    fn test_replace_makes_store_fresh() {
        let (cache, _clock) = create_test_cache(1800);

        cache.replace(records("first"));

        assert!(cache.is_fresh());
        let cached = cache.read().expect("payload should be present");
        assert_eq!(*cached.data, records("first"));
        assert_eq!(cached.age_seconds, 0);
        assert!(!cached.is_expired);
    }

    #[test]
    fn test_age_is_whole_seconds() {
        let (cache, clock) = create_test_cache(1800);
        cache.replace(records("aging"));

        clock.advance(ChronoDuration::milliseconds(42_900));

        assert_eq!(cache.read().unwrap().age_seconds, 42);
    }

    #[test]
    fn test_entry_expires_at_ttl_but_stays_readable() {
        let (cache, clock) = create_test_cache(60);
        cache.replace(records("expiring"));

        clock.advance(ChronoDuration::seconds(59));
        assert!(cache.is_fresh());

        clock.advance(ChronoDuration::seconds(1));
        assert!(!cache.is_fresh(), "age == ttl is no longer fresh");

        let cached = cache.read().expect("stale payload is still readable");
        assert!(cached.is_expired);
        assert_eq!(cached.age_seconds, 60);
        assert_eq!(*cached.data, records("expiring"));
    }

    #[test]
    fn test_replace_resets_timestamp() {
        let (cache, clock) = create_test_cache(60);
        cache.replace(records("old"));
        clock.advance(ChronoDuration::seconds(120));
        assert!(!cache.is_fresh());

        cache.replace(records("new"));

        let cached = cache.read().unwrap();
        assert!(!cached.is_expired);
        assert_eq!(cached.age_seconds, 0);
        assert_eq!(*cached.data, records("new"));
    }

    #[test]
    fn test_clock_moving_backwards_yields_zero_age() {
        let (cache, clock) = create_test_cache(60);
        cache.replace(records("skew"));
        clock.advance(ChronoDuration::seconds(-30));

        let cached = cache.read().unwrap();
        assert_eq!(cached.age_seconds, 0);
        assert!(!cached.is_expired);
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let (cache, _clock) = create_test_cache(0);
        cache.replace(records("instant"));

        assert!(!cache.is_fresh());
        assert!(cache.has_payload());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_pairs() {
        let (cache, clock) = create_test_cache(3600);
        let cache = Arc::new(cache);

        // Each payload is tagged with the clock second it was written at
        let writer = {
            let cache = cache.clone();
            let clock = clock.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    clock.set(Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap());
                    cache.replace(records(&i.to_string()));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        if let Some(cached) = cache.read() {
                            let tag: i64 = cached.data[0].0["Name"].as_str().unwrap().parse().unwrap();
                            assert_eq!(cached.cached_at.timestamp(), 1_700_000_000 + tag);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
