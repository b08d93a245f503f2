//! Shared, swappable navigation data.
//!
//! Readers take an `Arc` snapshot and keep it for the whole query; a rebuild
//! publishes a fresh snapshot without disturbing searches already running on
//! the old one.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::Result;
use super::builder::OctreeBuilder;
use super::data::OctreeData;
use super::oracle::OccupancyOracle;

/// Thread-safe handle to the current navigation snapshot
pub struct NavDataHandle {
    current: RwLock<Arc<OctreeData>>,
    /// Incremented on every publish
    generation: AtomicU32,
}

impl NavDataHandle {
    pub fn new(data: OctreeData) -> Self {
        Self::from_arc(Arc::new(data))
    }

    pub fn from_arc(data: Arc<OctreeData>) -> Self {
        Self {
            current: RwLock::new(data),
            generation: AtomicU32::new(0),
        }
    }

    /// Current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<OctreeData> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Get current generation (increments on each publish).
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the snapshot. Returns the new generation.
    pub fn publish(&self, data: Arc<OctreeData>) -> u32 {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = data;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Build outside the lock and publish on success. A failed build leaves
    /// the current snapshot in place.
    pub fn rebuild<O: OccupancyOracle + ?Sized>(&self, builder: &OctreeBuilder, oracle: &O) -> Result<u32> {
        let data = builder.build(oracle)?;
        let generation = self.publish(Arc::new(data));
        log::debug!("Published navigation snapshot generation {}", generation);
        Ok(generation)
    }
}
