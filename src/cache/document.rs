use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::generator::{GenerateError, Generator};
use crate::domain::settings::LedgerSettings;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::document";

pub const CACHE_HIT_METRIC: &str = "beancount_example_cache_hit_total";
pub const CACHE_MISS_METRIC: &str = "beancount_example_cache_miss_total";
pub const CACHE_CLEAR_METRIC: &str = "beancount_example_cache_clear_total";
pub const GENERATE_MS_METRIC: &str = "beancount_example_generate_ms";

#[derive(Clone)]
struct CacheEntry {
    settings: LedgerSettings,
    document: Arc<str>,
}

/// Single-slot memoizing wrapper around [`Generator`].
///
/// Reads are served from the slot while it holds a document for equal
/// settings. Misses are filled one at a time: concurrent callers queue on the
/// fill gate and pick up the document produced by whoever got there first.
/// A failed fill leaves the slot empty so the next read retries.
pub struct DocumentCache {
    generator: Arc<Generator>,
    slot: RwLock<Option<CacheEntry>>,
    fill: Mutex<()>,
    generations: AtomicU64,
}

impl DocumentCache {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self {
            generator,
            slot: RwLock::new(None),
            fill: Mutex::new(()),
            generations: AtomicU64::new(0),
        }
    }

    /// Return the document for `settings`, generating it on a miss.
    pub async fn get(&self, settings: &LedgerSettings) -> Result<Arc<str>, GenerateError> {
        if let Some(document) = self.peek(settings) {
            counter!(CACHE_HIT_METRIC).increment(1);
            return Ok(document);
        }

        let _fill = self.fill.lock().await;
        if let Some(document) = self.peek(settings) {
            counter!(CACHE_HIT_METRIC).increment(1);
            debug!(target = SOURCE, "Cache filled while waiting on gate");
            return Ok(document);
        }
        counter!(CACHE_MISS_METRIC).increment(1);

        let generator = Arc::clone(&self.generator);
        let key = *settings;
        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || generator.generate_for(&key, None))
            .await
            .map_err(|err| GenerateError::Task(err.to_string()))
            .and_then(|result| result);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        histogram!(GENERATE_MS_METRIC).record(elapsed_ms);
        self.generations.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(text) => {
                let document: Arc<str> = Arc::from(text);
                *rw_write(&self.slot, SOURCE, "store") = Some(CacheEntry {
                    settings: key,
                    document: Arc::clone(&document),
                });
                info!(
                    target = SOURCE,
                    settings = %key,
                    bytes = document.len(),
                    elapsed_ms,
                    "Ledger generated and cached"
                );
                Ok(document)
            }
            Err(err) => {
                *rw_write(&self.slot, SOURCE, "evict_on_failure") = None;
                warn!(
                    target = SOURCE,
                    settings = %key,
                    error = %err,
                    "Ledger generation failed; cache left empty"
                );
                Err(err)
            }
        }
    }

    /// Return the cached document for `settings` without generating.
    pub fn peek(&self, settings: &LedgerSettings) -> Option<Arc<str>> {
        rw_read(&self.slot, SOURCE, "peek")
            .as_ref()
            .filter(|entry| entry.settings == *settings)
            .map(|entry| Arc::clone(&entry.document))
    }

    /// Drop the cached document so the next read regenerates.
    pub fn clear(&self) {
        counter!(CACHE_CLEAR_METRIC).increment(1);
        let evicted = rw_write(&self.slot, SOURCE, "clear").take().is_some();
        debug!(target = SOURCE, evicted, "Cache cleared");
    }

    pub fn is_empty(&self) -> bool {
        rw_read(&self.slot, SOURCE, "is_empty").is_none()
    }

    /// Number of generation attempts made through this cache.
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }
}
