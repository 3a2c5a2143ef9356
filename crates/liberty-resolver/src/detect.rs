//! Target runtime version detection.

use std::path::Path;

use liberty_core::{Edition, ResolverConfig, RuntimeVersion};
use liberty_features::InstalledRuntime;

/// Determine the target runtime version for a workspace folder.
///
/// Detection order: explicit configuration pin, then the version metadata of
/// an installed runtime below the folder, then the bundled default.
/// Detection never fails a request; an unreadable marker just falls through.
/// Pure read, no side effects.
pub fn detect_version(folder: &Path, config: &ResolverConfig) -> RuntimeVersion {
    if let Some(pinned) = &config.version_override {
        match RuntimeVersion::new(pinned, Edition::OpenLiberty) {
            Some(version) => return version,
            None => {
                tracing::debug!(
                    target = "liberty.resolver",
                    pinned = %pinned,
                    "ignoring unusable version override"
                );
            }
        }
    }

    if let Some(runtime) = InstalledRuntime::locate(folder) {
        match runtime.version_metadata() {
            Some(version) => return version,
            None => {
                tracing::debug!(
                    target = "liberty.resolver",
                    runtime = %runtime.root().display(),
                    "installed runtime has no usable version metadata"
                );
            }
        }
    }

    RuntimeVersion::default_version()
}

#[cfg(test)]
mod tests {
    use super::*;
    use liberty_core::DEFAULT_RUNTIME_VERSION;
    use pretty_assertions::assert_eq;

    #[test]
    fn falls_back_to_the_default_version() {
        let tmp = tempfile::tempdir().unwrap();
        let version = detect_version(tmp.path(), &ResolverConfig::default());
        assert_eq!(version.version(), DEFAULT_RUNTIME_VERSION);
        assert_eq!(version.edition(), Edition::OpenLiberty);
    }

    #[test]
    fn reads_installed_runtime_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let versions = tmp.path().join("wlp/lib/versions");
        std::fs::create_dir_all(&versions).unwrap();
        std::fs::write(
            versions.join("openliberty.properties"),
            "com.ibm.websphere.productId=com.ibm.websphere.appserver\n\
com.ibm.websphere.productVersion=22.0.0.3\n",
        )
        .unwrap();

        let version = detect_version(tmp.path(), &ResolverConfig::default());
        assert_eq!(version.version(), "22.0.0.3");
        assert_eq!(version.edition(), Edition::WebSphereLiberty);
    }

    #[test]
    fn configuration_pin_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ResolverConfig {
            version_override: Some("19.0.0.5".to_string()),
            ..ResolverConfig::default()
        };
        let version = detect_version(tmp.path(), &config);
        assert_eq!(version.version(), "19.0.0.5");
    }

    #[test]
    fn malformed_metadata_degrades_to_the_default() {
        let tmp = tempfile::tempdir().unwrap();
        let versions = tmp.path().join("wlp/lib/versions");
        std::fs::create_dir_all(&versions).unwrap();
        std::fs::write(versions.join("openliberty.properties"), "garbage").unwrap();

        let version = detect_version(tmp.path(), &ResolverConfig::default());
        assert_eq!(version.version(), DEFAULT_RUNTIME_VERSION);
    }
}
