//! Bounded model cache with least-recently-used eviction.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{ModelVariant, TtsModel};

/// Bounded registry of resident model handles.
///
/// Accelerator memory is the scarce resource: at most `capacity` instances
/// stay loaded, and inserting past the bound evicts the least-recently-used
/// entry, tearing its handle down before the insert returns. A successful
/// `get` or `put` marks the entry most-recently-used.
pub struct ModelCache {
    inner: Mutex<CacheInner>,
    coalesce_loads: bool,
    /// Per-variant gates serializing loads of the same absent id.
    load_gates: Mutex<HashMap<ModelVariant, Arc<tokio::sync::Mutex<()>>>>,
}

struct CacheInner {
    capacity: usize,
    /// Monotonic recency clock; every touch gets a fresh, unique stamp, so
    /// eviction order is total and insertion order falls out naturally.
    tick: u64,
    entries: HashMap<ModelVariant, CacheEntry>,
}

struct CacheEntry {
    handle: Arc<dyn TtsModel>,
    last_used: u64,
}

impl ModelCache {
    pub fn new(capacity: usize, coalesce_loads: bool) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity: capacity.max(1),
                tick: 0,
                entries: HashMap::new(),
            }),
            coalesce_loads,
            load_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the resident handle if present, marking it most-recently-
    /// used. No side effect on absence.
    pub fn get(&self, variant: ModelVariant) -> Option<Arc<dyn TtsModel>> {
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        inner.tick += 1;
        let tick = inner.tick;
        let entry = inner.entries.get_mut(&variant)?;
        entry.last_used = tick;
        Some(Arc::clone(&entry.handle))
    }

    /// Returns the resident handle, or runs `loader` and caches its result.
    ///
    /// On loader failure nothing is cached and the error propagates. With
    /// load coalescing enabled, a concurrent miss for the same variant
    /// waits for the in-flight load and then re-checks the cache; with it
    /// disabled, simultaneous misses may each run the loader.
    pub async fn get_or_load<F, Fut>(
        &self,
        variant: ModelVariant,
        loader: F,
    ) -> Result<Arc<dyn TtsModel>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn TtsModel>>>,
    {
        if let Some(handle) = self.get(variant) {
            return Ok(handle);
        }

        if !self.coalesce_loads {
            let handle = loader().await?;
            self.put(variant, Arc::clone(&handle));
            return Ok(handle);
        }

        let gate = self.load_gate(variant);
        let _guard = gate.lock().await;

        // A concurrent load may have finished while we waited on the gate.
        if let Some(handle) = self.get(variant) {
            return Ok(handle);
        }

        let handle = loader().await?;
        self.put(variant, Arc::clone(&handle));
        Ok(handle)
    }

    /// Inserts or replaces, marking the entry most-recently-used. Evicts
    /// and tears down the least-recently-used entry when over capacity, so
    /// the caller observes a cache already within bounds.
    pub fn put(&self, variant: ModelVariant, handle: Arc<dyn TtsModel>) {
        let evicted = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            inner.tick += 1;
            let tick = inner.tick;
            inner.entries.insert(variant, CacheEntry { handle, last_used: tick });

            let mut evicted = Vec::new();
            while inner.entries.len() > inner.capacity {
                let lru = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(variant, _)| *variant);
                match lru {
                    Some(victim) => {
                        if let Some(entry) = inner.entries.remove(&victim) {
                            evicted.push((victim, entry.handle));
                        }
                    }
                    None => break,
                }
            }
            evicted
        };

        // Teardown runs outside the lock: releasing accelerator memory can
        // be slow and must not stall concurrent readers.
        for (victim, handle) in evicted {
            debug!(model = %victim, "Evicting least-recently-used model");
            teardown(victim, &handle);
        }
    }

    /// Removes an entry, tearing down its handle. Returns whether it was
    /// present.
    pub fn remove(&self, variant: ModelVariant) -> bool {
        let removed = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            inner.entries.remove(&variant)
        };
        match removed {
            Some(entry) => {
                teardown(variant, &entry.handle);
                true
            }
            None => false,
        }
    }

    /// Removes every entry, tearing each handle down.
    pub fn clear(&self) {
        let drained: Vec<_> = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");
            inner.entries.drain().collect()
        };
        for (variant, entry) in drained {
            teardown(variant, &entry.handle);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, variant: ModelVariant) -> bool {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .entries
            .contains_key(&variant)
    }

    fn load_gate(&self, variant: ModelVariant) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.load_gates.lock().expect("load gate lock poisoned");
        Arc::clone(
            gates
                .entry(variant)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

fn teardown(variant: ModelVariant, handle: &Arc<dyn TtsModel>) {
    if let Err(err) = handle.unload() {
        // Teardown failures never block the structural operation.
        warn!(model = %variant, "Model teardown failed: {err}");
    }
}
