//! Navigation data serialization and disk I/O

use std::path::{Path, PathBuf};

use rkyv::{Archive, Deserialize, Serialize};

use crate::cache::key::CacheKey;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::svo::config::BuildConfig;
use crate::svo::data::OctreeData;
use crate::svo::layer::OctreeLayer;
use crate::svo::leaf::LeafGrid;

/// Bumped whenever the archived layout changes
pub const FORMAT_VERSION: u32 = 1;

/// File extension for cached navigation data
pub const NAVDATA_EXTENSION: &str = "svn";

/// Serializable navigation data.
///
/// OctreeNode and LeafGrid are plain-old-data, so the layer arrays are
/// archived as they are stored.
#[derive(Archive, Deserialize, Serialize)]
pub struct NavDataArchive {
    pub version: u32,
    pub key: u64,
    pub origin: [f32; 3],
    pub half_extent: f32,
    pub voxel_size: f32,
    pub max_depth: u8,
    pub clearance: f32,
    pub geometry_version: u64,
    pub layers: Vec<OctreeLayer>,
    pub leaves: Vec<LeafGrid>,
}

impl NavDataArchive {
    fn config(&self) -> BuildConfig {
        BuildConfig {
            origin: self.origin,
            half_extent: self.half_extent,
            voxel_size: self.voxel_size,
            max_depth: self.max_depth,
            clearance: self.clearance,
            geometry_version: self.geometry_version,
        }
    }
}

/// Serialize navigation data to bytes (uncompressed)
pub fn serialize_navdata(data: &OctreeData) -> Result<Vec<u8>> {
    let config = data.config();
    let archive = NavDataArchive {
        version: FORMAT_VERSION,
        key: CacheKey::for_config(config).0,
        origin: config.origin,
        half_extent: config.half_extent,
        voxel_size: config.voxel_size,
        max_depth: config.max_depth,
        clearance: config.clearance,
        geometry_version: config.geometry_version,
        layers: data.layers().to_vec(),
        leaves: data.leaves().to_vec(),
    };

    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&archive)
        .map_err(|e| Error::Cache(format!("serialization failed: {}", e)))?;
    Ok(bytes.to_vec())
}

/// Deserialize navigation data from bytes (uncompressed).
///
/// Rejects unknown format versions, archives whose stored key does not
/// match their own configuration and structurally broken layer arrays.
pub fn deserialize_navdata(bytes: &[u8]) -> Result<OctreeData> {
    // rkyv validation requires the buffer to be aligned
    let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);

    let archive: NavDataArchive = rkyv::from_bytes::<NavDataArchive, rkyv::rancor::Error>(&aligned)
        .map_err(|e| Error::Cache(format!("invalid archive: {}", e)))?;

    if archive.version != FORMAT_VERSION {
        return Err(Error::Cache(format!(
            "unsupported format version {} (expected {})",
            archive.version, FORMAT_VERSION
        )));
    }

    let config = archive.config();
    config.validate().map_err(|e| Error::Cache(format!("archived config rejected: {}", e)))?;
    let key = CacheKey::for_config(&config);
    if key.0 != archive.key {
        return Err(Error::Cache(format!(
            "key mismatch: archive says {:016x}, config hashes to {}",
            archive.key, key
        )));
    }

    let data = OctreeData::from_parts(config, archive.layers, archive.leaves);
    data.validate_structure()?;
    Ok(data)
}

/// Compress serialized navigation data using LZ4
pub fn compress_navdata(data: &OctreeData) -> Result<Vec<u8>> {
    let serialized = serialize_navdata(data)?;
    Ok(lz4_flex::compress_prepend_size(&serialized))
}

/// Decompress and deserialize navigation data
pub fn decompress_navdata(bytes: &[u8]) -> Result<OctreeData> {
    let decompressed = lz4_flex::decompress_size_prepended(bytes)
        .map_err(|e| Error::Cache(format!("LZ4 decompression failed: {}", e)))?;
    deserialize_navdata(&decompressed)
}

/// Get the file path for a cache key
pub fn navdata_path(base_dir: &Path, key: CacheKey) -> PathBuf {
    base_dir.join(format!("navdata_{}.{}", key, NAVDATA_EXTENSION))
}

/// Save navigation data to disk (compressed). Returns the written path.
pub async fn save_navdata(base_dir: &Path, data: &OctreeData) -> Result<PathBuf> {
    let key = CacheKey::for_config(data.config());
    let path = navdata_path(base_dir, key);

    tokio::fs::create_dir_all(base_dir).await?;

    let compressed = compress_navdata(data)?;
    let size = compressed.len();
    tokio::fs::write(&path, compressed).await?;

    log::info!("Saved navigation data {} ({} bytes) to {}", key, size, path.display());
    Ok(path)
}

/// Load navigation data for a key from disk (if it exists).
///
/// A file whose contents belong to a different key is reported as
/// [`Error::Cache`].
pub async fn load_navdata(base_dir: &Path, key: CacheKey) -> Result<Option<OctreeData>> {
    let path = navdata_path(base_dir, key);

    if !tokio::fs::try_exists(&path).await? {
        return Ok(None);
    }

    let compressed = tokio::fs::read(&path).await?;
    let data = decompress_navdata(&compressed)?;

    let found = CacheKey::for_config(data.config());
    if found != key {
        return Err(Error::Cache(format!("{} holds data for key {}, expected {}", path.display(), found, key)));
    }

    log::debug!("Loaded navigation data {} from {}", key, path.display());
    Ok(Some(data))
}

/// Delete cached navigation data from disk
pub async fn delete_navdata(base_dir: &Path, key: CacheKey) -> Result<()> {
    let path = navdata_path(base_dir, key);

    if tokio::fs::try_exists(&path).await? {
        tokio::fs::remove_file(&path).await?;
    }

    Ok(())
}

/// Check if navigation data for a key exists on disk
pub async fn navdata_exists(base_dir: &Path, key: CacheKey) -> bool {
    tokio::fs::try_exists(navdata_path(base_dir, key)).await.unwrap_or(false)
}
