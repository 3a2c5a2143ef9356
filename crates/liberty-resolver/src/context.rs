//! Workspace state and the resolution pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

use liberty_cache::SchemaCache;
use liberty_core::{ResolverConfig, RuntimeVersion};
use liberty_features::{
    bundled_default_set, bundled_features_json, generate_feature_list, parse_feature_list,
    parse_features_json, serialize_feature_list, FeatureSet, InstalledRuntime, Provenance,
};
use liberty_registry::{FeatureRegistry, FetchOutcome, MavenRegistryClient};
use liberty_schema::generate_schema;

/// The outcome of one (folder, version) resolution.
///
/// Carries the artifact locations so hover can cite its sources, and the
/// artifact bytes themselves: the embedding XML engine consumes the schema
/// directly, and a resolution that could not persist retries from these on a
/// later access without redoing network or generation work.
#[derive(Debug)]
pub struct ResolvedFeatures {
    pub set: FeatureSet,
    pub feature_list_path: PathBuf,
    pub schema_path: PathBuf,
    pub persisted: bool,
    pub feature_list_bytes: Vec<u8>,
    pub schema_bytes: Vec<u8>,
}

enum Slot {
    InFlight,
    Ready(Arc<ResolvedFeatures>),
}

struct FolderState {
    root: PathBuf,
    /// Lazily opened; `None` after a failed open is retried on next access.
    cache: Mutex<Option<Arc<SchemaCache>>>,
    slots: Mutex<HashMap<String, Slot>>,
    ready: Condvar,
}

impl FolderState {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: Mutex::new(None),
            slots: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
        }
    }

    fn cache(&self) -> Option<Arc<SchemaCache>> {
        let mut guard = self.cache.lock().unwrap_or_else(|poison| poison.into_inner());
        if guard.is_none() {
            match SchemaCache::open(&self.root) {
                Ok(cache) => *guard = Some(Arc::new(cache)),
                Err(err) => {
                    tracing::warn!(
                        target = "liberty.resolver",
                        folder = %self.root.display(),
                        error = %err,
                        "cannot open cache directory; continuing without persistence"
                    );
                }
            }
        }
        guard.clone()
    }

    /// Where an artifact will live once persistence succeeds. Used for hover
    /// citations even while the entry is memory-only.
    fn expected_artifact_path(&self, file_name: &str) -> PathBuf {
        match self.cache() {
            Some(cache) => cache.root().join(file_name),
            None => self.root.join(".libertyls").join(file_name),
        }
    }
}

/// Explicit process-wide context owning per-folder resolution state.
///
/// Construct one at startup, register workspace folders as the editor opens
/// them, and drop it at teardown. There is no global accessor.
pub struct WorkspaceContext {
    config: ResolverConfig,
    registry: Arc<dyn FeatureRegistry>,
    folders: Mutex<HashMap<PathBuf, Arc<FolderState>>>,
}

impl WorkspaceContext {
    pub fn new(config: ResolverConfig) -> Self {
        let registry: Arc<dyn FeatureRegistry> = match &config.registry_url {
            Some(url) => Arc::new(MavenRegistryClient::with_base_url(url)),
            None => Arc::new(MavenRegistryClient::new()),
        };
        Self::with_registry(config, registry)
    }

    /// Construct with an explicit registry implementation. Tests use this to
    /// substitute fakes with call counters.
    pub fn with_registry(config: ResolverConfig, registry: Arc<dyn FeatureRegistry>) -> Self {
        Self {
            config,
            registry,
            folders: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Register a workspace folder. Idempotent.
    pub fn add_folder(&self, root: impl Into<PathBuf>) {
        let root = root.into();
        let mut folders = self.folders.lock().unwrap_or_else(|poison| poison.into_inner());
        folders
            .entry(root.clone())
            .or_insert_with(|| Arc::new(FolderState::new(root)));
    }

    /// Drop a folder's in-memory state. On-disk artifacts are kept; use
    /// [`WorkspaceContext::clear_folder`] first to remove them.
    pub fn remove_folder(&self, root: &Path) {
        let mut folders = self.folders.lock().unwrap_or_else(|poison| poison.into_inner());
        folders.remove(root);
    }

    /// The registered folder owning `document_path`, or its parent directory
    /// when the document is outside every registered folder.
    pub fn folder_for_document(&self, document_path: &Path) -> PathBuf {
        let folders = self.folders.lock().unwrap_or_else(|poison| poison.into_inner());
        folders
            .keys()
            .filter(|root| document_path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
            .unwrap_or_else(|| {
                document_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| document_path.to_path_buf())
            })
    }

    /// Resolve the feature set for the folder owning a document.
    pub fn resolve_document(&self, document_path: &Path) -> Arc<ResolvedFeatures> {
        let folder = self.folder_for_document(document_path);
        self.resolve_folder(&folder)
    }

    /// Resolve the feature set for a workspace folder.
    ///
    /// Total: always returns a set, falling back through the published
    /// registry artifact, local generation, and the bundled default.
    /// Concurrent first resolutions for the same (folder, version) coalesce
    /// to a single in-flight computation; cached resolutions return without
    /// any network or generation work.
    pub fn resolve_folder(&self, folder: &Path) -> Arc<ResolvedFeatures> {
        let state = self.folder_state(folder);
        let version = crate::detect::detect_version(&state.root, &self.config);
        let key = version.cache_key();

        // Coalescing point: at most one in-flight resolution per key.
        let existing = {
            let mut slots = state.slots.lock().unwrap_or_else(|poison| poison.into_inner());
            loop {
                match slots.get(&key) {
                    Some(Slot::Ready(resolved)) => break Some(resolved.clone()),
                    Some(Slot::InFlight) => {
                        slots = state
                            .ready
                            .wait(slots)
                            .unwrap_or_else(|poison| poison.into_inner());
                    }
                    None => {
                        slots.insert(key.clone(), Slot::InFlight);
                        break None;
                    }
                }
            }
        };
        if let Some(resolved) = existing {
            return self.retry_persistence(&state, &version, resolved);
        }

        let resolved = Arc::new(self.perform_resolution(&state, &version));

        let mut slots = state.slots.lock().unwrap_or_else(|poison| poison.into_inner());
        slots.insert(key, Slot::Ready(resolved.clone()));
        state.ready.notify_all();
        resolved
    }

    /// Remove a folder's cache entries and artifacts. The next resolution
    /// for the folder starts from scratch.
    pub fn clear_folder(&self, folder: &Path) {
        let state = self.folder_state(folder);
        {
            let mut slots = state.slots.lock().unwrap_or_else(|poison| poison.into_inner());
            slots.clear();
        }
        if let Some(cache) = state.cache() {
            if let Err(err) = cache.clear() {
                tracing::warn!(
                    target = "liberty.resolver",
                    folder = %folder.display(),
                    error = %err,
                    "failed to clear cache directory"
                );
            }
        }
    }

    fn folder_state(&self, folder: &Path) -> Arc<FolderState> {
        let mut folders = self.folders.lock().unwrap_or_else(|poison| poison.into_inner());
        folders
            .entry(folder.to_path_buf())
            .or_insert_with(|| Arc::new(FolderState::new(folder.to_path_buf())))
            .clone()
    }

    /// A memory-only entry retries persistence on each access until it
    /// sticks; the request itself is never blocked on the outcome.
    fn retry_persistence(
        &self,
        state: &FolderState,
        version: &RuntimeVersion,
        resolved: Arc<ResolvedFeatures>,
    ) -> Arc<ResolvedFeatures> {
        if resolved.persisted {
            return resolved;
        }

        let Some(cache) = state.cache() else {
            return resolved;
        };
        match cache.store(
            version,
            resolved.set.provenance(),
            &resolved.feature_list_bytes,
            &resolved.schema_bytes,
        ) {
            Ok(entry) => {
                let persisted = Arc::new(ResolvedFeatures {
                    set: resolved.set.clone(),
                    feature_list_path: entry.feature_list_path,
                    schema_path: entry.schema_path,
                    persisted: true,
                    feature_list_bytes: resolved.feature_list_bytes.clone(),
                    schema_bytes: resolved.schema_bytes.clone(),
                });
                let mut slots = state.slots.lock().unwrap_or_else(|poison| poison.into_inner());
                slots.insert(version.cache_key(), Slot::Ready(persisted.clone()));
                persisted
            }
            Err(err) => {
                tracing::warn!(
                    target = "liberty.resolver",
                    version = %version,
                    error = %err,
                    "cache persistence retry failed; keeping in-memory entry"
                );
                resolved
            }
        }
    }

    fn perform_resolution(&self, state: &FolderState, version: &RuntimeVersion) -> ResolvedFeatures {
        // Trusted entries (remote, bundled) are terminal. A generated entry
        // is kept as the fallback but does not suppress one registry attempt
        // per session: the registry is authoritative once reachable, so a
        // version published since the entry was generated supersedes it.
        // Mid-session, any resolved entry short-circuits at the coalescing
        // map and never reaches this point again.
        let mut cached_generated = None;
        if let Some(cache) = state.cache() {
            if let Some(entry) = cache.lookup(version) {
                match load_cached(&entry, version) {
                    Some(resolved) if entry.provenance.is_authoritative() => {
                        tracing::debug!(
                            target = "liberty.resolver",
                            version = %version,
                            provenance = entry.provenance.as_str(),
                            "resolved from cache"
                        );
                        return resolved;
                    }
                    Some(resolved) => {
                        cached_generated = Some(resolved);
                    }
                    None => {
                        tracing::debug!(
                            target = "liberty.resolver",
                            version = %version,
                            "cached artifacts unreadable; re-resolving"
                        );
                    }
                }
            }
        }

        // The registry is authoritative: it reflects what was actually
        // published for the version.
        match self.registry.fetch(version, self.config.request_delay()) {
            Ok(FetchOutcome::Fetched(bytes)) => match parse_features_json(&bytes, version) {
                Ok(set) => {
                    return self.finish(state, version, set, bytes);
                }
                Err(err) => {
                    tracing::warn!(
                        target = "liberty.resolver",
                        version = %version,
                        error = %err,
                        "published artifact is unreadable; falling back to local generation"
                    );
                }
            },
            Ok(FetchOutcome::NotFound) => {
                tracing::debug!(
                    target = "liberty.resolver",
                    version = %version,
                    "version not published; falling back to local generation"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target = "liberty.resolver",
                    version = %version,
                    error = %err,
                    "registry unreachable; falling back to local generation"
                );
            }
        }

        // The registry had nothing new: reuse the cached generated artifact
        // instead of re-scanning the installation.
        if let Some(resolved) = cached_generated {
            tracing::debug!(
                target = "liberty.resolver",
                version = %version,
                "reusing cached generated feature list"
            );
            return resolved;
        }

        if let Some(runtime) = InstalledRuntime::locate(&state.root) {
            match generate_feature_list(&runtime, version) {
                Ok(set) => {
                    let bytes = serialize_feature_list(&set).into_bytes();
                    return self.finish(state, version, set, bytes);
                }
                Err(err) => {
                    tracing::warn!(
                        target = "liberty.resolver",
                        version = %version,
                        runtime = %runtime.root().display(),
                        error = %err,
                        "feature list generation failed; using bundled defaults"
                    );
                }
            }
        } else {
            tracing::debug!(
                target = "liberty.resolver",
                folder = %state.root.display(),
                version = %version,
                "no local installation; using bundled defaults"
            );
        }

        let set = bundled_default_set(version);
        let bytes = bundled_features_json().as_bytes().to_vec();
        self.finish(state, version, set, bytes)
    }

    fn finish(
        &self,
        state: &FolderState,
        version: &RuntimeVersion,
        set: FeatureSet,
        feature_list_bytes: Vec<u8>,
    ) -> ResolvedFeatures {
        let provenance = set.provenance();
        let schema_bytes = generate_schema(&set).into_bytes();

        let stored = state.cache().and_then(|cache| {
            match cache.store(version, provenance, &feature_list_bytes, &schema_bytes) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(
                        target = "liberty.resolver",
                        version = %version,
                        error = %err,
                        "cache persistence failed; returning in-memory result"
                    );
                    None
                }
            }
        });

        let feature_list_name = SchemaCache::feature_list_file_name(version, provenance);
        let schema_name = SchemaCache::schema_file_name(version);

        match stored {
            Some(entry) => ResolvedFeatures {
                set,
                feature_list_path: entry.feature_list_path,
                schema_path: entry.schema_path,
                persisted: true,
                feature_list_bytes,
                schema_bytes,
            },
            None => ResolvedFeatures {
                set,
                feature_list_path: state.expected_artifact_path(&feature_list_name),
                schema_path: state.expected_artifact_path(&schema_name),
                persisted: false,
                feature_list_bytes,
                schema_bytes,
            },
        }
    }
}

/// Rehydrate a feature set from a cache entry's artifacts.
fn load_cached(
    entry: &liberty_cache::CacheEntry,
    version: &RuntimeVersion,
) -> Option<ResolvedFeatures> {
    let feature_list_bytes = std::fs::read(&entry.feature_list_path).ok()?;
    let schema_bytes = std::fs::read(&entry.schema_path).ok()?;

    let set = match entry.provenance {
        Provenance::Remote => parse_features_json(&feature_list_bytes, version).ok()?,
        Provenance::BundledDefault => {
            let parsed = parse_features_json(&feature_list_bytes, version).ok()?;
            FeatureSet::new(
                version.clone(),
                Provenance::BundledDefault,
                parsed.features().to_vec(),
            )
        }
        Provenance::Generated => {
            parse_feature_list(std::str::from_utf8(&feature_list_bytes).ok()?, version).ok()?
        }
    };

    Some(ResolvedFeatures {
        set,
        feature_list_path: entry.feature_list_path.clone(),
        schema_path: entry.schema_path.clone(),
        persisted: true,
        feature_list_bytes,
        schema_bytes,
    })
}
