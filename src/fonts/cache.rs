//! Shared cache of decoded CMaps.
//!
//! Decoding `UniJIS-UTF16-H` yields tens of thousands of entries. Fonts that
//! read the same resource from the same [`CMapSource`] with the same range
//! cap get the same immutable map, so they share it through an `Arc`.
//!
//! An entry is keyed by encoding id, range cap and source identity. Two
//! fonts with distinct source instances never share a map, even when the
//! encoding ids match. The cache keeps each keyed source alive, so a source
//! address is never reused by a different source while its entry exists.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::fonts::cmap::UnicodeToCidMap;
use crate::fonts::resource::CMapSource;

lazy_static::lazy_static! {
    static ref GLOBAL: Arc<CMapCache> = Arc::new(CMapCache::new());
}

/// Identity of one decoded CMap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CMapKey {
    encoding_id: String,
    max_range_len: u32,
    source: usize,
}

impl CMapKey {
    /// Key for `encoding_id` read from `source` with the given range cap.
    pub fn new(encoding_id: &str, max_range_len: u32, source: &Arc<dyn CMapSource>) -> Self {
        Self {
            encoding_id: encoding_id.to_string(),
            max_range_len,
            source: Arc::as_ptr(source) as *const () as usize,
        }
    }

    /// Encoding id of the keyed resource.
    pub fn encoding_id(&self) -> &str {
        &self.encoding_id
    }

    /// Range cap the map was decoded with.
    pub fn max_range_len(&self) -> u32 {
        self.max_range_len
    }
}

struct Entry {
    map: Arc<UnicodeToCidMap>,
    // Held so the source address stays unique while the entry exists.
    _source: Arc<dyn CMapSource>,
}

/// Hit/miss counters of a [`CMapCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that had to decode
    pub misses: u64,
    /// Maps currently cached
    pub entries: usize,
}

/// Thread-safe map from [`CMapKey`] to decoded CMap.
#[derive(Default)]
pub struct CMapCache {
    entries: Mutex<HashMap<CMapKey, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for CMapCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CMapCache").field("stats", &self.stats()).finish()
    }
}

impl CMapCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<CMapCache> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CMapKey, Entry>> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached map for a key, if present.
    pub fn get(&self, key: &CMapKey) -> Option<Arc<UnicodeToCidMap>> {
        self.lock().get(key).map(|entry| Arc::clone(&entry.map))
    }

    /// Return the cached map for `encoding_id` from `source`, or decode it
    /// with `load` and cache the result.
    ///
    /// The lock is held while loading, so one key is decoded at most once
    /// even under concurrent requests. Failures are not cached.
    pub fn get_or_load<F>(
        &self,
        source: &Arc<dyn CMapSource>,
        encoding_id: &str,
        max_range_len: u32,
        load: F,
    ) -> Result<Arc<UnicodeToCidMap>>
    where
        F: FnOnce() -> Result<UnicodeToCidMap>,
    {
        let key = CMapKey::new(encoding_id, max_range_len, source);
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("CMap cache hit: {}", encoding_id);
            return Ok(Arc::clone(&entry.map));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let map = Arc::new(load()?);
        entries.insert(
            key,
            Entry {
                map: Arc::clone(&map),
                _source: Arc::clone(source),
            },
        );
        log::debug!("CMap cache stored {} ({} entries)", encoding_id, map.len());
        Ok(map)
    }

    /// Drop every cached map of an encoding. Fonts holding one keep their copy.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&self, encoding_id: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| key.encoding_id != encoding_id);
        before - entries.len()
    }

    /// Drop all cached maps and reset statistics.
    pub fn clear(&self) {
        self.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fonts::resource::MemorySource;
    use std::io;

    fn sample_map() -> UnicodeToCidMap {
        [(0x41, 34), (0x42, 35)].into_iter().collect()
    }

    fn source() -> Arc<dyn CMapSource> {
        Arc::new(MemorySource::new())
    }

    #[test]
    fn test_get_or_load_caches() {
        let cache = CMapCache::new();
        let src = source();
        let first = cache.get_or_load(&src, "Test-H", 16, || Ok(sample_map())).unwrap();
        let second = cache
            .get_or_load(&src, "Test-H", 16, || panic!("should not decode twice"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get(&CMapKey::new("Test-H", 16, &src)).is_some());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_distinct_sources_are_not_shared() {
        let cache = CMapCache::new();
        let a = source();
        let b = source();
        let from_a = cache.get_or_load(&a, "Test-H", 16, || Ok(sample_map())).unwrap();
        let from_b = cache
            .get_or_load(&b, "Test-H", 16, || Ok([(0x41, 1)].into_iter().collect()))
            .unwrap();
        assert_eq!(from_a.get(0x41), Some(34));
        assert_eq!(from_b.get(0x41), Some(1));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_range_cap_is_part_of_key() {
        let cache = CMapCache::new();
        let src = source();
        cache.get_or_load(&src, "Test-H", 2, || Ok(UnicodeToCidMap::default())).unwrap();
        let wide = cache.get_or_load(&src, "Test-H", 16, || Ok(sample_map())).unwrap();
        assert_eq!(wide.get(0x41), Some(34));
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let cache = CMapCache::new();
        let src = source();
        let result = cache.get_or_load(&src, "Broken-H", 16, || {
            Err(Error::ResourceUnavailable {
                resource: "Broken-H".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            })
        });
        assert!(result.is_err());
        assert!(cache.get(&CMapKey::new("Broken-H", 16, &src)).is_none());
        assert!(cache.get_or_load(&src, "Broken-H", 16, || Ok(sample_map())).is_ok());
    }

    #[test]
    fn test_clear_and_remove() {
        let cache = CMapCache::new();
        let src = source();
        cache.get_or_load(&src, "A-H", 16, || Ok(sample_map())).unwrap();
        cache.get_or_load(&src, "A-H", 32, || Ok(sample_map())).unwrap();
        cache.get_or_load(&src, "B-H", 16, || Ok(sample_map())).unwrap();
        assert_eq!(cache.remove("A-H"), 2);
        assert_eq!(cache.stats().entries, 1);
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_concurrent_loads_decode_once() {
        use std::sync::atomic::AtomicUsize;
        use std::thread;

        let cache = Arc::new(CMapCache::new());
        let src = source();
        let decodes = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let src = Arc::clone(&src);
                let decodes = Arc::clone(&decodes);
                thread::spawn(move || {
                    cache
                        .get_or_load(&src, "Shared-H", 16, || {
                            decodes.fetch_add(1, Ordering::SeqCst);
                            Ok(sample_map())
                        })
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().get(0x41), Some(34));
        }
        assert_eq!(decodes.load(Ordering::SeqCst), 1);
    }
}
