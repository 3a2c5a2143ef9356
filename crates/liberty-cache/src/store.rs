use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use liberty_core::RuntimeVersion;
use liberty_features::Provenance;
use serde::{Deserialize, Serialize};

use crate::cache_dir::cache_dir_for_folder;
use crate::error::Result;
use crate::util::{atomic_write, now_millis};

pub const CACHE_INDEX_FILENAME: &str = "cache-index.json";

/// One row of the on-disk pointer table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexRecord {
    feature_list: String,
    schema: String,
    provenance: String,
    stored_at_millis: u64,
}

/// A resolved pointer into the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub feature_list_path: PathBuf,
    pub schema_path: PathBuf,
    pub provenance: Provenance,
    pub stored_at_millis: u64,
}

/// The per-workspace-folder artifact cache.
///
/// The pointer table is held in memory and mirrored to `cache-index.json`
/// with the same atomic-publish discipline as the artifacts themselves. A
/// corrupt index degrades to an empty cache, never an error.
#[derive(Debug)]
pub struct SchemaCache {
    root: PathBuf,
    index: Mutex<BTreeMap<String, IndexRecord>>,
}

impl SchemaCache {
    /// Open (and lazily create) the cache for a workspace folder.
    pub fn open(folder: &Path) -> Result<Self> {
        let root = cache_dir_for_folder(folder)?;
        let index = load_index(&root);
        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of the feature-list artifact for a version.
    ///
    /// Remote (and bundled) artifacts keep the registry's JSON form;
    /// generated artifacts are feature-list XML. The distinction is an
    /// observable contract: tests assert a `featurelist-*.xml` exists
    /// exactly when resolution fell back to generation.
    pub fn feature_list_file_name(version: &RuntimeVersion, provenance: Provenance) -> String {
        match provenance {
            Provenance::Remote | Provenance::BundledDefault => {
                format!("features-{}.json", version.cache_key())
            }
            Provenance::Generated => format!("featurelist-{}.xml", version.cache_key()),
        }
    }

    /// File name of the schema artifact for a version.
    pub fn schema_file_name(version: &RuntimeVersion) -> String {
        format!("{}.xsd", version.cache_key())
    }

    /// O(1) pointer lookup. Never performs network or generation work.
    pub fn lookup(&self, version: &RuntimeVersion) -> Option<CacheEntry> {
        let key = version.cache_key();
        let mut index = self.index.lock().unwrap_or_else(|poison| poison.into_inner());
        let record = index.get(&key)?;

        let Some(provenance) = Provenance::from_str(&record.provenance) else {
            tracing::debug!(
                target = "liberty.cache",
                key = %key,
                provenance = %record.provenance,
                "dropping cache record with unknown provenance"
            );
            index.remove(&key);
            return None;
        };

        let entry = CacheEntry {
            feature_list_path: self.root.join(&record.feature_list),
            schema_path: self.root.join(&record.schema),
            provenance,
            stored_at_millis: record.stored_at_millis,
        };

        // A pointer to artifacts that vanished out from under us (external
        // cleanup) is a miss, not an error.
        if !entry.feature_list_path.is_file() || !entry.schema_path.is_file() {
            tracing::debug!(
                target = "liberty.cache",
                key = %key,
                "cache record points at missing artifacts; treating as a miss"
            );
            index.remove(&key);
            return None;
        }

        Some(entry)
    }

    /// Persist both artifacts for a version, then atomically republish the
    /// pointer table.
    ///
    /// Artifact files are never rewritten in place across provenance changes:
    /// a remote resolution superseding a generated one writes differently
    /// named files and only the pointer moves.
    pub fn store(
        &self,
        version: &RuntimeVersion,
        provenance: Provenance,
        feature_list: &[u8],
        schema: &[u8],
    ) -> Result<CacheEntry> {
        let feature_list_name = Self::feature_list_file_name(version, provenance);
        let schema_name = Self::schema_file_name(version);

        let feature_list_path = self.root.join(&feature_list_name);
        let schema_path = self.root.join(&schema_name);

        atomic_write(&feature_list_path, feature_list)?;
        atomic_write(&schema_path, schema)?;

        let record = IndexRecord {
            feature_list: feature_list_name,
            schema: schema_name,
            provenance: provenance.as_str().to_string(),
            stored_at_millis: now_millis(),
        };
        let entry = CacheEntry {
            feature_list_path,
            schema_path,
            provenance,
            stored_at_millis: record.stored_at_millis,
        };

        let snapshot = {
            let mut index = self.index.lock().unwrap_or_else(|poison| poison.into_inner());
            index.insert(version.cache_key(), record);
            index.clone()
        };
        self.persist_index(&snapshot)?;

        tracing::debug!(
            target = "liberty.cache",
            key = %version.cache_key(),
            provenance = provenance.as_str(),
            "stored cache entry"
        );
        Ok(entry)
    }

    /// Remove every entry and artifact for this folder.
    pub fn clear(&self) -> Result<()> {
        {
            let mut index = self.index.lock().unwrap_or_else(|poison| poison.into_inner());
            index.clear();
        }

        for dir_entry in std::fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_type()?.is_file() {
                std::fs::remove_file(dir_entry.path())?;
            }
        }
        Ok(())
    }

    fn persist_index(&self, index: &BTreeMap<String, IndexRecord>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(index)?;
        atomic_write(&self.root.join(CACHE_INDEX_FILENAME), &bytes)
    }
}

fn load_index(root: &Path) -> BTreeMap<String, IndexRecord> {
    let path = root.join(CACHE_INDEX_FILENAME);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(
                    target = "liberty.cache",
                    path = %path.display(),
                    error = %err,
                    "failed to read cache index"
                );
            }
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(index) => index,
        Err(err) => {
            tracing::debug!(
                target = "liberty.cache",
                path = %path.display(),
                error = %err,
                "corrupt cache index; starting empty"
            );
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liberty_core::Edition;
    use pretty_assertions::assert_eq;

    fn version() -> RuntimeVersion {
        RuntimeVersion::new("22.0.0.3", Edition::OpenLiberty).unwrap()
    }

    #[test]
    fn lookup_misses_before_any_store() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SchemaCache::open(tmp.path()).unwrap();
        assert!(cache.lookup(&version()).is_none());
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SchemaCache::open(tmp.path()).unwrap();

        let entry = cache
            .store(&version(), Provenance::Remote, b"[]", b"<schema/>")
            .unwrap();
        assert_eq!(entry.provenance, Provenance::Remote);
        assert!(entry.feature_list_path.ends_with("features-ol-22.0.0.3.json"));
        assert!(entry.schema_path.ends_with("ol-22.0.0.3.xsd"));

        let found = cache.lookup(&version()).unwrap();
        assert_eq!(found, entry);
        assert_eq!(std::fs::read(&found.schema_path).unwrap(), b"<schema/>");
    }

    #[test]
    fn entries_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let cache = SchemaCache::open(tmp.path()).unwrap();
            cache
                .store(&version(), Provenance::Generated, b"<featureInfo/>", b"<schema/>")
                .unwrap();
        }

        let cache = SchemaCache::open(tmp.path()).unwrap();
        let entry = cache.lookup(&version()).unwrap();
        assert_eq!(entry.provenance, Provenance::Generated);
        assert!(entry
            .feature_list_path
            .ends_with("featurelist-ol-22.0.0.3.xml"));
    }

    #[test]
    fn superseding_store_moves_the_pointer_and_keeps_old_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SchemaCache::open(tmp.path()).unwrap();

        let generated = cache
            .store(&version(), Provenance::Generated, b"<featureInfo/>", b"<schema/>")
            .unwrap();
        let remote = cache
            .store(&version(), Provenance::Remote, b"[]", b"<schema v=\"2\"/>")
            .unwrap();

        let entry = cache.lookup(&version()).unwrap();
        assert_eq!(entry.provenance, Provenance::Remote);
        assert_eq!(entry.feature_list_path, remote.feature_list_path);

        // Append-only: the superseded artifact file is still on disk.
        assert!(generated.feature_list_path.is_file());
    }

    #[test]
    fn corrupt_index_degrades_to_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let cache = SchemaCache::open(tmp.path()).unwrap();
            cache
                .store(&version(), Provenance::Remote, b"[]", b"<schema/>")
                .unwrap();
        }

        std::fs::write(tmp.path().join(".libertyls").join(CACHE_INDEX_FILENAME), b"{ nope")
            .unwrap();

        let cache = SchemaCache::open(tmp.path()).unwrap();
        assert!(cache.lookup(&version()).is_none());
    }

    #[test]
    fn missing_artifacts_invalidate_the_pointer() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SchemaCache::open(tmp.path()).unwrap();
        let entry = cache
            .store(&version(), Provenance::Remote, b"[]", b"<schema/>")
            .unwrap();

        std::fs::remove_file(&entry.schema_path).unwrap();
        assert!(cache.lookup(&version()).is_none());
    }

    #[test]
    fn clear_removes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SchemaCache::open(tmp.path()).unwrap();
        cache
            .store(&version(), Provenance::Remote, b"[]", b"<schema/>")
            .unwrap();

        cache.clear().unwrap();
        assert!(cache.lookup(&version()).is_none());

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path().join(".libertyls"))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty(), "leftover files: {leftovers:?}");
    }
}
