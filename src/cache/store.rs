//! LRU cache for built navigation data
//!
//! Keeps shared snapshots of recently used navigation data in memory and,
//! when given a directory, mirrors them to disk so a later run can skip the
//! build entirely.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::disk_io;
use crate::cache::key::CacheKey;
use crate::core::types::Result;
use crate::svo::builder::OctreeBuilder;
use crate::svo::config::BuildConfig;
use crate::svo::data::OctreeData;
use crate::svo::oracle::OccupancyOracle;

/// Where [`NavDataCache::load_or_build`] found its result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Disk,
    Built,
}

/// LRU cache for navigation data
pub struct NavDataCache {
    entries: HashMap<CacheKey, Arc<OctreeData>>,
    /// Access order: oldest first, newest last
    access_order: Vec<CacheKey>,
    max_entries: usize,
    dir: Option<PathBuf>,
}

impl NavDataCache {
    /// Memory-only cache holding at most `max_entries` snapshots
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_entries),
            access_order: Vec::with_capacity(max_entries),
            max_entries: max_entries.max(1),
            dir: None,
        }
    }

    /// Cache that also persists built data under `dir`
    pub fn with_dir(max_entries: usize, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::new(max_entries)
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Get a snapshot by key, marking it as recently used
    pub fn get(&mut self, key: CacheKey) -> Option<Arc<OctreeData>> {
        let data = self.entries.get(&key).cloned()?;
        self.update_access_order(key);
        Some(data)
    }

    /// Insert a snapshot under its config's key.
    ///
    /// Returns the evicted snapshot if the cache was full.
    pub fn insert(&mut self, data: Arc<OctreeData>) -> Option<Arc<OctreeData>> {
        let key = CacheKey::for_config(data.config());

        if self.entries.contains_key(&key) {
            self.remove_from_access_order(key);
        }

        let evicted = if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_oldest()
        } else {
            None
        };

        let replaced = self.entries.insert(key, data);
        self.access_order.push(key);

        evicted.or(replaced)
    }

    pub fn remove(&mut self, key: CacheKey) -> Option<Arc<OctreeData>> {
        self.remove_from_access_order(key);
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: CacheKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the least recently used snapshot
    pub fn evict_oldest(&mut self) -> Option<Arc<OctreeData>> {
        let key = self.access_order.first().copied()?;
        log::debug!("Evicting navigation data {}", key);
        self.remove(key)
    }

    /// Return navigation data for `config`, trying memory, then disk, then
    /// building it from `oracle`. Freshly built data is written to disk when
    /// the cache has a directory.
    ///
    /// A corrupt or mismatched file on disk is logged and rebuilt over.
    pub async fn load_or_build<O: OccupancyOracle + ?Sized>(
        &mut self,
        config: BuildConfig,
        oracle: &O,
    ) -> Result<(Arc<OctreeData>, CacheSource)> {
        config.validate()?;
        let key = CacheKey::for_config(&config);

        if let Some(data) = self.get(key) {
            log::debug!("Navigation data {} served from memory", key);
            return Ok((data, CacheSource::Memory));
        }

        if let Some(dir) = self.dir.clone() {
            match disk_io::load_navdata(&dir, key).await {
                Ok(Some(data)) => {
                    log::info!("Navigation data {} loaded from {}", key, dir.display());
                    let data = Arc::new(data);
                    self.insert(Arc::clone(&data));
                    return Ok((data, CacheSource::Disk));
                }
                Ok(None) => {}
                Err(e) => log::warn!("Discarding cached navigation data {}: {}", key, e),
            }
        }

        let data = Arc::new(OctreeBuilder::new(config)?.build(oracle)?);
        if let Some(dir) = &self.dir {
            disk_io::save_navdata(dir, &data).await?;
        }
        self.insert(Arc::clone(&data));
        Ok((data, CacheSource::Built))
    }

    fn update_access_order(&mut self, key: CacheKey) {
        self.remove_from_access_order(key);
        self.access_order.push(key);
    }

    fn remove_from_access_order(&mut self, key: CacheKey) {
        if let Some(pos) = self.access_order.iter().position(|&k| k == key) {
            self.access_order.remove(pos);
        }
    }
}
