use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use std::sync::atomic::{AtomicU64, Ordering};
use sha2::{Sha256, Digest};
use parking_lot::Mutex;

use super::config::RankOptions;
use super::models::ConceptMatch;


pub struct RankCache {
    cache: Mutex<LruCache<String, (Vec<ConceptMatch>, Instant)>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl RankCache {
    pub fn new(capacity: NonZeroUsize, ttl_secs: u64) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<ConceptMatch>> {
        let mut cache = self.cache.lock();
        let fresh = match cache.get(key) {
            Some((value, timestamp)) if timestamp.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        };

        match fresh {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                cache.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: String, value: Vec<ConceptMatch>) {
        self.cache.lock().put(key, (value, Instant::now()));
    }

    pub fn make_key(text: &str, options: &RankOptions) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update([0u8]);
        hasher.update(options.limit.to_le_bytes());
        hasher.update(options.threshold.to_bits().to_le_bytes());
        if let Some(tag) = options.normalized_tag() {
            hasher.update(tag.as_bytes());
        }
        hasher.update([0u8]);
        hasher.update([u8::from(options.include_prerequisites)]);
        format!("{:x}", hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        CacheStats {
            hits,
            misses,
            size: self.cache.lock().len(),
            hit_rate,
        }
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
