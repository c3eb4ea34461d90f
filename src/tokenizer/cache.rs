//! Bounded cache of loaded tokenizers, keyed by model identifier.
//!
//! Loading a tokenizer means fetching and deserializing its vocabulary and merge
//! rules, so instances are kept in a least-recently-used cache. A miss runs the
//! [`TokenizerLoader`] on the blocking thread pool; concurrent misses for the same
//! model share a single load, while loads for different models proceed in parallel.
//! Failed loads are never cached.

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use super::{
    error::{LoadCause, LoadError},
    factory::TokenizerLoader,
    traits::Tokenizer,
};

/// Default number of resident tokenizers
pub const DEFAULT_CACHE_CAPACITY: usize = 20;

type Handle = Arc<dyn Tokenizer>;

/// A load in progress for one model. Holds the outcome once the load finishes.
type Flight = Arc<OnceCell<Result<Handle, LoadError>>>;

/// Point-in-time view of cache occupancy and activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// LRU cache of tokenizer handles with single-flight loading.
pub struct TokenizerCache {
    /// Resident handles in recency order. Never locked across an await.
    entries: Mutex<LruCache<String, Handle>>,
    /// Loads currently running, one cell per model
    in_flight: DashMap<String, Flight>,
    loader: Arc<dyn TokenizerLoader>,
    /// Access token handed to the loader
    credential: Option<String>,
    load_timeout: Option<Duration>,
    counters: Counters,
}

impl TokenizerCache {
    pub fn new(capacity: NonZeroUsize, loader: Arc<dyn TokenizerLoader>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: DashMap::new(),
            loader,
            credential: None,
            load_timeout: None,
            counters: Counters::default(),
        }
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    /// Fail loads that take longer than `timeout`. The stalled load keeps running
    /// on its blocking thread but no caller waits for it.
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Return the tokenizer for `model_id`, loading it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the identifier is empty or the loader fails. Callers
    /// waiting on the same load share its failure, but it is not remembered: the
    /// next call for the model loads again.
    pub async fn get_or_load(&self, model_id: &str) -> Result<Handle, LoadError> {
        if model_id.is_empty() {
            return Err(LoadError::new(model_id, LoadCause::EmptyModelId));
        }

        if let Some(tokenizer) = self.lookup(model_id) {
            Counters::bump(&self.counters.hits);
            return Ok(tokenizer);
        }
        Counters::bump(&self.counters.misses);

        let flight = self
            .in_flight
            .entry(model_id.to_string())
            .or_default()
            .value()
            .clone();
        let _retire = FlightGuard {
            in_flight: &self.in_flight,
            model_id,
            flight: &flight,
        };

        // Every caller that joined this flight receives its outcome, success or failure.
        let outcome = flight
            .get_or_init(|| async {
                // Another flight for this model may have finished since our lookup.
                if let Some(tokenizer) = self.lookup(model_id) {
                    return Ok(tokenizer);
                }
                let tokenizer = self.load(model_id).await?;
                self.insert(model_id, Arc::clone(&tokenizer));
                Ok::<Handle, LoadError>(tokenizer)
            })
            .await
            .clone();
        outcome
    }

    async fn load(&self, model_id: &str) -> Result<Handle, LoadError> {
        info!(model_id = %model_id, "Loading tokenizer");
        let start = Instant::now();

        let task = tokio::task::spawn_blocking({
            let loader = Arc::clone(&self.loader);
            let credential = self.credential.clone();
            let model_id = model_id.to_string();
            move || loader.load(&model_id, credential.as_deref())
        });

        let joined = match self.load_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .unwrap_or_else(|_| Ok(Err(LoadCause::Timeout(limit)))),
            None => task.await,
        };
        let outcome = joined.unwrap_or_else(|e| Err(LoadCause::Aborted(e.to_string())));

        match outcome {
            Ok(tokenizer) => {
                Counters::bump(&self.counters.loads);
                info!(
                    model_id = %model_id,
                    vocab_size = tokenizer.vocab_size(),
                    elapsed_ms = %start.elapsed().as_millis(),
                    "Tokenizer loaded"
                );
                Ok(tokenizer)
            }
            Err(cause) => {
                Counters::bump(&self.counters.load_failures);
                error!(
                    model_id = %model_id,
                    error = %cause,
                    elapsed_ms = %start.elapsed().as_millis(),
                    "Error loading the tokenizer"
                );
                Err(LoadError::new(model_id, cause))
            }
        }
    }

    fn lookup(&self, model_id: &str) -> Option<Handle> {
        self.entries.lock().get(model_id).cloned()
    }

    fn insert(&self, model_id: &str, tokenizer: Handle) {
        // The displaced handle is dropped after the lock is released.
        let displaced = self.entries.lock().push(model_id.to_string(), tokenizer);
        if let Some((evicted, _)) = displaced {
            if evicted != model_id {
                Counters::bump(&self.counters.evictions);
                info!(model_id = %evicted, "Evicted least recently used tokenizer");
            }
        }
    }

    /// Whether `model_id` is resident. Does not count as an access.
    pub fn contains(&self, model_id: &str) -> bool {
        self.entries.lock().contains(model_id)
    }

    /// Resident model identifiers, most recently used first
    #[cfg(test)]
    fn resident_models(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(model_id, _)| model_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Drop every resident tokenizer. In-flight loads still insert when they finish.
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Tokenizer cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, capacity) = {
            let guard = self.entries.lock();
            (guard.len(), guard.cap().get())
        };
        CacheStats {
            entries,
            capacity,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for TokenizerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.entries.lock();
        f.debug_struct("TokenizerCache")
            .field("entries", &guard.len())
            .field("capacity", &guard.cap())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

/// Removes a flight from the in-flight map when a caller leaves it, whether the
/// caller finished or was cancelled. A finished flight is always removed, so the
/// next request for a failed model loads again. An unfinished flight stays while
/// other callers still wait on it; one of them takes over the load.
struct FlightGuard<'a> {
    in_flight: &'a DashMap<String, Flight>,
    model_id: &'a str,
    flight: &'a Flight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // The map and this caller hold one reference each.
        self.in_flight.remove_if(self.model_id, |_, current| {
            Arc::ptr_eq(current, self.flight)
                && (current.initialized() || Arc::strong_count(current) <= 2)
        });
    }
}
