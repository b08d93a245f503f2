//! Cache keys for built navigation data

use std::fmt;

use crate::svo::config::BuildConfig;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Byte-wise FNV-1a hasher. Stable across runs and platforms, unlike
/// `std::collections::hash_map::DefaultHasher`.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1a(u64);

impl Fnv1a {
    pub fn new() -> Self {
        Self(FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= byte as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write(&value.to_bits().to_le_bytes());
    }

    pub fn finish(&self) -> u64 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies navigation data built from a given volume, resolution and
/// world geometry revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(pub u64);

impl CacheKey {
    pub fn for_config(config: &BuildConfig) -> Self {
        let mut hasher = Fnv1a::new();
        for c in config.origin {
            hasher.write_f32(c);
        }
        hasher.write_f32(config.half_extent);
        hasher.write_f32(config.voxel_size);
        hasher.write(&[config.max_depth]);
        hasher.write_f32(config.clearance);
        hasher.write_u64(config.geometry_version);
        CacheKey(hasher.finish())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(Fnv1a::new().finish(), 0xcbf29ce484222325);
        let mut hasher = Fnv1a::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_key_tracks_inputs() {
        let base = BuildConfig::default();
        let key = CacheKey::for_config(&base);
        assert_eq!(key, CacheKey::for_config(&base.clone()));

        assert_ne!(key, CacheKey::for_config(&base.clone().with_geometry_version(1)));
        assert_ne!(key, CacheKey::for_config(&base.clone().with_clearance(0.5)));
        let deeper = BuildConfig { max_depth: 5, half_extent: 64.0, ..base.clone() };
        assert_ne!(key, CacheKey::for_config(&deeper));
    }

    #[test]
    fn test_display() {
        assert_eq!(CacheKey(0xab).to_string(), "00000000000000ab");
    }
}
