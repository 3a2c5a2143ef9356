use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

/// Directory name created inside each workspace folder.
const CACHE_DIR_NAME: &str = ".libertyls";

/// Resolve (and lazily create) the cache directory for a workspace folder.
///
/// By default this is `<folder>/.libertyls`. When `LIBERTY_LS_CACHE_DIR` is
/// set, caches for all folders live under it instead, keyed by a hash of the
/// folder path so distinct folders never share a directory.
pub fn cache_dir_for_folder(folder: &Path) -> Result<PathBuf> {
    let dir = match std::env::var_os("LIBERTY_LS_CACHE_DIR") {
        Some(root) => PathBuf::from(root).join(folder_key(folder)),
        None => folder.join(CACHE_DIR_NAME),
    };

    std::fs::create_dir_all(&dir)?;
    if !dir.is_dir() {
        return Err(CacheError::UnusableCacheDir { path: dir });
    }
    Ok(dir)
}

fn folder_key(folder: &Path) -> String {
    let canonical = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);

    let stem = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "folder".to_string());
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(32)
        .collect();

    format!("{stem}-{:016x}", hasher.finish())
}
