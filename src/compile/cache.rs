//! Compiled validator cache keyed by definition fingerprint

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::debug;

use super::{compile, CompiledValidator, Fingerprint};
use crate::config::CompilerConfig;
use crate::schema::SchemaDefinition;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Shared, append-on-miss store of compiled validators
///
/// Entries for one fingerprint are interchangeable, so two threads compiling
/// the same definition concurrently is harmless: the last insert wins.
#[derive(Default)]
pub struct ValidatorCache {
    entries: RwLock<HashMap<Fingerprint, Arc<CompiledValidator>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Fingerprint, Arc<CompiledValidator>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Fingerprint, Arc<CompiledValidator>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<CompiledValidator>> {
        self.read().get(fingerprint).cloned()
    }

    /// Look up `definition`, compiling and inserting it on a miss
    pub fn get_or_compile(
        &self,
        definition: &SchemaDefinition,
        options: &CompilerConfig,
    ) -> Arc<CompiledValidator> {
        let fingerprint = Fingerprint::of(definition);
        if let Some(found) = self.get(&fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Compiled outside the lock; children re-enter the cache
        let compiled = Arc::new(compile(definition, fingerprint.clone(), self, options));
        debug!(
            fingerprint = %fingerprint.short(),
            kind = definition.kind_name(),
            depth = compiled.depth(),
            complexity = compiled.complexity(),
            "Compiled validator"
        );
        self.write().insert(fingerprint, Arc::clone(&compiled));
        compiled
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        self.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, object, string, Schema, StringChecks};
    use std::thread;

    #[test]
    fn test_structurally_identical_definitions_share_entry() {
        let cache = ValidatorCache::new();
        let options = CompilerConfig::default();

        let a = cache.get_or_compile(&string().email().definition(), &options);
        let b = cache.get_or_compile(&string().email().definition(), &options);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_children_are_cached() {
        let cache = ValidatorCache::new();
        let options = CompilerConfig::default();
        let schema = object()
            .field("a", string())
            .field("b", string())
            .field("list", array(string()));

        cache.get_or_compile(&schema.definition(), &options);
        // object, array, and one shared string entry
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&Fingerprint::of(&string().definition())).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = ValidatorCache::new();
        cache.get_or_compile(&string().definition(), &CompilerConfig::default());
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_concurrent_population() {
        let cache = Arc::new(ValidatorCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let schema = object().field("id", string().uuid());
                    let compiled = cache.get_or_compile(&schema.definition(), &CompilerConfig::default());
                    compiled
                        .validate(&serde_json::json!({"id": "123e4567-e89b-12d3-a456-426614174000"}))
                        .is_ok()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 2);
    }
}
