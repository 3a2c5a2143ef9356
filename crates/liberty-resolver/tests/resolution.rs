//! End-to-end resolution behavior against a fake registry.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use liberty_core::{ResolverConfig, RuntimeVersion};
use liberty_features::Provenance;
use liberty_registry::{FeatureRegistry, FetchOutcome, RegistryError};
use liberty_resolver::WorkspaceContext;

enum FakeResponse {
    Published(Vec<u8>),
    NotFound,
    NetworkError,
}

struct FakeRegistry {
    response: std::sync::Mutex<FakeResponse>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeRegistry {
    fn new(response: FakeResponse) -> Arc<Self> {
        Arc::new(Self {
            response: std::sync::Mutex::new(response),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    fn with_delay(response: FakeResponse, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response: std::sync::Mutex::new(response),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn set_response(&self, response: FakeResponse) {
        *self.response.lock().unwrap() = response;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeatureRegistry for FakeRegistry {
    fn fetch(
        &self,
        _version: &RuntimeVersion,
        _timeout: Duration,
    ) -> Result<FetchOutcome, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &*self.response.lock().unwrap() {
            FakeResponse::Published(bytes) => Ok(FetchOutcome::Fetched(bytes.clone())),
            FakeResponse::NotFound => Ok(FetchOutcome::NotFound),
            FakeResponse::NetworkError => Err(RegistryError::Transport {
                url: "http://registry.invalid/features.json".to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn published_artifact(short_names: &[&str]) -> Vec<u8> {
    let records: Vec<String> = short_names
        .iter()
        .map(|name| {
            format!(
                r#"{{"name":"io.openliberty.features.{name}","description":"Support for {name}.","shortDescription":"{name}","wlpInformation":{{"shortName":"{name}","visibility":"PUBLIC"}}}}"#
            )
        })
        .collect();
    format!("[{}]", records.join(",")).into_bytes()
}

fn write_installed_runtime(folder: &Path, product_id: &str, product_version: &str) {
    let wlp = folder.join("wlp");
    let features = wlp.join("lib/features");
    let versions = wlp.join("lib/versions");
    std::fs::create_dir_all(&features).unwrap();
    std::fs::create_dir_all(&versions).unwrap();

    std::fs::write(
        versions.join("openliberty.properties"),
        format!(
            "com.ibm.websphere.productId={product_id}\ncom.ibm.websphere.productVersion={product_version}\n"
        ),
    )
    .unwrap();

    for (file, short) in [
        ("com.ibm.websphere.appserver.servlet-3.1.mf", "servlet-3.1"),
        ("com.ibm.websphere.appserver.batch-1.0.mf", "batch-1.0"),
        ("com.ibm.websphere.appserver.jaxrs-2.1.mf", "jaxrs-2.1"),
    ] {
        std::fs::write(
            features.join(file),
            format!(
                "Subsystem-SymbolicName: com.ibm.websphere.appserver.{short}; visibility:=public\n\
IBM-ShortName: {short}\n\
Subsystem-Name: {short}\n\
Subsystem-Description: Support for {short}.\n"
            ),
        )
        .unwrap();
    }
}

fn context(registry: &Arc<FakeRegistry>) -> WorkspaceContext {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    WorkspaceContext::with_registry(ResolverConfig::default(), registry.clone())
}

#[test]
fn published_version_resolves_remote_and_writes_no_featurelist() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::new(FakeResponse::Published(published_artifact(&[
        "servlet-3.1",
        "batch-1.0",
    ])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::Remote);
    assert!(resolved.persisted);
    assert_eq!(registry.calls(), 1);

    let cache_dir = tmp.path().join(".libertyls");
    assert!(cache_dir.join("features-ol-24.0.0.6.json").is_file());
    // No local generation happened: the generated-artifact name must not
    // exist. This file's absence is part of the observable contract.
    assert!(!cache_dir.join("featurelist-ol-24.0.0.6.xml").exists());
}

#[test]
fn re_resolution_is_a_no_op_with_identical_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::new(FakeResponse::Published(published_artifact(&["jdbc-4.3"])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let first = ctx.resolve_folder(tmp.path());
    let schema_bytes_first = std::fs::read(&first.schema_path).unwrap();

    let second = ctx.resolve_folder(tmp.path());
    assert_eq!(registry.calls(), 1, "second resolution must not refetch");
    assert!(Arc::ptr_eq(&first, &second));

    let schema_bytes_second = std::fs::read(&second.schema_path).unwrap();
    assert_eq!(schema_bytes_first, schema_bytes_second);
}

#[test]
fn unpublished_version_generates_from_the_local_install() {
    let tmp = tempfile::tempdir().unwrap();
    write_installed_runtime(tmp.path(), "com.ibm.websphere.appserver", "18.0.0.1");

    let registry = FakeRegistry::new(FakeResponse::NotFound);
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::Generated);
    assert_eq!(resolved.set.version().version(), "18.0.0.1");
    assert!(resolved.set.find("servlet-3.1").is_some());

    // The generated artifact is written under its version-qualified name.
    let featurelist = tmp.path().join(".libertyls/featurelist-wlp-18.0.0.1.xml");
    assert!(featurelist.is_file(), "expected generated {featurelist:?}");
    assert!(tmp.path().join(".libertyls/wlp-18.0.0.1.xsd").is_file());
}

#[test]
fn network_error_without_install_degrades_to_bundled_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::new(FakeResponse::NetworkError);
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::BundledDefault);
    assert!(!resolved.set.is_empty(), "completion must never go empty");
}

#[test]
fn generated_entry_is_not_retried_mid_session_but_reloads_across_sessions() {
    let tmp = tempfile::tempdir().unwrap();
    write_installed_runtime(tmp.path(), "io.openliberty", "18.0.0.1");

    let registry = FakeRegistry::new(FakeResponse::NotFound);
    {
        let ctx = context(&registry);
        ctx.add_folder(tmp.path());
        ctx.resolve_folder(tmp.path());
        ctx.resolve_folder(tmp.path());
        assert_eq!(registry.calls(), 1, "generated entries are not retried mid-session");
    }

    // A later session asks the registry once more (remote is authoritative
    // once reachable) but on NotFound reuses the cached generated artifact
    // rather than re-scanning the installation, which is gone by now.
    std::fs::remove_dir_all(tmp.path().join("wlp/lib/features")).unwrap();
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());
    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::Generated);
    assert_eq!(registry.calls(), 2);
    assert!(resolved.set.find("batch-1.0").is_some());
}

#[test]
fn publication_supersedes_a_stale_generated_entry_in_a_new_session() {
    let tmp = tempfile::tempdir().unwrap();
    write_installed_runtime(tmp.path(), "io.openliberty", "18.0.0.1");

    let registry = FakeRegistry::new(FakeResponse::NotFound);
    {
        let ctx = context(&registry);
        ctx.add_folder(tmp.path());
        let resolved = ctx.resolve_folder(tmp.path());
        assert_eq!(resolved.set.provenance(), Provenance::Generated);
    }

    // The artifact is published between sessions; the next session's first
    // resolution picks it up and the pointer moves to the remote artifact.
    registry.set_response(FakeResponse::Published(published_artifact(&["jaxrs-2.1"])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());
    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::Remote);
    assert!(resolved.set.find("jaxrs-2.1").is_some());
    assert!(tmp.path().join(".libertyls/features-ol-18.0.0.1.json").is_file());
}

#[test]
fn concurrent_first_resolutions_fetch_exactly_once() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::with_delay(
        FakeResponse::Published(published_artifact(&["servlet-3.1"])),
        Duration::from_millis(100),
    );
    let ctx = Arc::new(context(&registry));
    ctx.add_folder(tmp.path());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = ctx.clone();
        let folder = tmp.path().to_path_buf();
        handles.push(std::thread::spawn(move || ctx.resolve_folder(&folder)));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(registry.calls(), 1, "burst of edits must coalesce to one fetch");
    for resolved in &results {
        assert_eq!(resolved.set.provenance(), Provenance::Remote);
        assert!(Arc::ptr_eq(resolved, &results[0]));
    }
}

#[test]
fn clear_folder_invalidates_and_forces_re_resolution() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::new(FakeResponse::Published(published_artifact(&["cdi-4.0"])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    ctx.resolve_folder(tmp.path());
    assert_eq!(registry.calls(), 1);

    ctx.clear_folder(tmp.path());
    assert!(!tmp.path().join(".libertyls/features-ol-24.0.0.6.json").exists());

    ctx.resolve_folder(tmp.path());
    assert_eq!(registry.calls(), 2);
}

#[test]
fn persistence_failure_still_returns_a_set_and_retries_later() {
    let tmp = tempfile::tempdir().unwrap();
    // A file squatting on the cache directory name makes every disk write
    // fail while leaving resolution itself intact.
    std::fs::write(tmp.path().join(".libertyls"), b"squatter").unwrap();

    let registry = FakeRegistry::new(FakeResponse::Published(published_artifact(&["jndi-1.0"])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let resolved = ctx.resolve_folder(tmp.path());
    assert_eq!(resolved.set.provenance(), Provenance::Remote);
    assert!(!resolved.persisted);
    assert_eq!(registry.calls(), 1);

    // Unblock the cache directory; the next access persists without
    // re-fetching.
    std::fs::remove_file(tmp.path().join(".libertyls")).unwrap();
    let retried = ctx.resolve_folder(tmp.path());
    assert!(retried.persisted);
    assert_eq!(registry.calls(), 1);
    assert!(tmp.path().join(".libertyls/features-ol-24.0.0.6.json").is_file());
}

#[test]
fn document_paths_map_to_their_registered_folder() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = FakeRegistry::new(FakeResponse::Published(published_artifact(&["ssl-1.0"])));
    let ctx = context(&registry);
    ctx.add_folder(tmp.path());

    let document = tmp.path().join("src/main/liberty/config/server.xml");
    assert_eq!(ctx.folder_for_document(&document), tmp.path());

    let resolved = ctx.resolve_document(&document);
    assert_eq!(resolved.set.provenance(), Provenance::Remote);
    assert_eq!(registry.calls(), 1);
}
