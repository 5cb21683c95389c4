use crate::config::CACHE_VERSION;
use crate::places::PlaceCatalog;
use anyhow::{Context, Result};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub version: u32,
    pub input_path: String,
    pub input_mtime: u64,
    pub input_size: u64,
    pub place_count: usize,
    pub redirect_count: usize,
}

#[derive(Deserialize)]
struct CatalogCacheDe {
    metadata: CacheMetadata,
    catalog: PlaceCatalog,
}

#[derive(Serialize)]
struct CatalogCacheSer<'a> {
    metadata: CacheMetadata,
    catalog: &'a PlaceCatalog,
}

pub fn cache_path(output_dir: &Path) -> PathBuf {
    output_dir.join("places.cache")
}

fn input_metadata(input_path: &str) -> Result<(u64, u64)> {
    let metadata = fs::metadata(input_path)
        .with_context(|| format!("Failed to get metadata for: {}", input_path))?;
    let mtime = metadata
        .modified()
        .context("Failed to get modification time")?
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("Invalid modification time")?
        .as_secs();
    Ok((mtime, metadata.len()))
}

/// Returns the cached catalog if it was built from this exact input file.
///
/// Missing, corrupt and stale caches all give `Ok(None)`.
pub fn try_load_catalog(cache_path: &Path, input_path: &str) -> Result<Option<PlaceCatalog>> {
    if !cache_path.exists() {
        return Ok(None);
    }

    let file_size = fs::metadata(cache_path).map(|m| m.len()).unwrap_or(0);
    let file = File::open(cache_path)
        .with_context(|| format!("Failed to open cache file: {:?}", cache_path))?;
    let reader = BufReader::with_capacity(256 * 1024, file);

    let options = bincode::options().with_limit(file_size.saturating_add(1024));
    let cache: CatalogCacheDe = match options.deserialize_from(reader) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Cache file is corrupt or unreadable");
            return Ok(None);
        }
    };

    let meta = &cache.metadata;
    if meta.version != CACHE_VERSION {
        info!(cached = meta.version, current = CACHE_VERSION, "Cache version mismatch");
        return Ok(None);
    }
    if meta.input_path != input_path {
        info!(cached = %meta.input_path, current = input_path, "Cache input path mismatch");
        return Ok(None);
    }
    let (mtime, size) = input_metadata(input_path)?;
    if meta.input_mtime != mtime || meta.input_size != size {
        info!(
            cached_mtime = meta.input_mtime,
            current_mtime = mtime,
            cached_size = meta.input_size,
            current_size = size,
            "Input file has changed since cache was created"
        );
        return Ok(None);
    }

    info!(
        places = meta.place_count,
        redirects = meta.redirect_count,
        "Place catalog loaded from cache"
    );
    Ok(Some(cache.catalog))
}

/// Writes the catalog next to the outputs, via a temp file and rename.
pub fn save_catalog(catalog: &PlaceCatalog, input_path: &str, output_dir: &Path) -> Result<()> {
    let path = cache_path(output_dir);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {:?}", output_dir))?;

    let (mtime, size) = input_metadata(input_path)?;
    let cache = CatalogCacheSer {
        metadata: CacheMetadata {
            version: CACHE_VERSION,
            input_path: input_path.to_string(),
            input_mtime: mtime,
            input_size: size,
            place_count: catalog.place_count(),
            redirect_count: catalog.redirect_count(),
        },
        catalog,
    };

    let tmp_path = path.with_extension("cache.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp cache file: {:?}", tmp_path))?;
    bincode::DefaultOptions::new()
        .serialize_into(BufWriter::new(file), &cache)
        .context("Failed to serialize place catalog")?;
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp cache file to: {:?}", path))?;

    info!(
        places = catalog.place_count(),
        redirects = catalog.redirect_count(),
        path = ?path,
        "Place catalog cached"
    );
    Ok(())
}
