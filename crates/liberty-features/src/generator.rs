//! Feature-list generation from a locally installed runtime.

use std::path::{Path, PathBuf};

use liberty_core::{Edition, RuntimeVersion};
use thiserror::Error;

use crate::manifest::parse_subsystem_manifest;
use crate::model::{Feature, FeatureSet, FeatureType, Provenance};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("runtime at {root} has no feature descriptor directory")]
    MissingFeaturesDir { root: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("installation at {root} yielded no usable feature descriptors")]
    NoFeatures { root: PathBuf },
}

/// A Liberty installation on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledRuntime {
    root: PathBuf,
}

/// Directories, relative to a workspace folder, where build tooling places
/// the runtime.
const RUNTIME_LOCATIONS: &[&str] = &["wlp", "target/liberty/wlp", "build/wlp"];

impl InstalledRuntime {
    pub fn from_root(root: impl AsRef<Path>) -> Option<Self> {
        let root = root.as_ref().to_path_buf();
        root.join("lib").is_dir().then_some(Self { root })
    }

    /// Look for an installed runtime below a workspace folder.
    pub fn locate(folder: &Path) -> Option<Self> {
        RUNTIME_LOCATIONS
            .iter()
            .map(|rel| folder.join(rel))
            .find_map(Self::from_root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn features_dir(&self) -> PathBuf {
        self.root.join("lib").join("features")
    }

    /// Read the runtime's own version metadata
    /// (`lib/versions/openliberty.properties`).
    ///
    /// Returns `None` when the metadata file is absent or does not carry a
    /// usable product version.
    pub fn version_metadata(&self) -> Option<RuntimeVersion> {
        let path = self.root.join("lib").join("versions").join("openliberty.properties");
        let text = std::fs::read_to_string(&path).ok()?;

        let mut product_version = None;
        let mut product_id = None;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "com.ibm.websphere.productVersion" => product_version = Some(value.trim()),
                "com.ibm.websphere.productId" => product_id = Some(value.trim()),
                _ => {}
            }
        }

        let edition = product_id
            .and_then(Edition::from_product_id)
            .unwrap_or(Edition::OpenLiberty);
        RuntimeVersion::new(product_version?, edition)
    }
}

/// Derive a feature set from an installed runtime's feature descriptors.
///
/// Descriptor files are visited in lexicographic name order and malformed
/// descriptors are skipped, so the output is deterministic for a given
/// installation and one bad descriptor never aborts the whole pass.
pub fn generate_feature_list(
    runtime: &InstalledRuntime,
    version: &RuntimeVersion,
) -> Result<FeatureSet, GeneratorError> {
    let features_dir = runtime.features_dir();
    if !features_dir.is_dir() {
        return Err(GeneratorError::MissingFeaturesDir {
            root: runtime.root().to_path_buf(),
        });
    }

    let mut descriptor_paths: Vec<PathBuf> = std::fs::read_dir(&features_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("mf"))
        .collect();
    descriptor_paths.sort();

    let mut features = Vec::new();
    for path in &descriptor_paths {
        match read_descriptor(path, version) {
            Some(feature) => features.push(feature),
            None => {
                tracing::debug!(
                    target = "liberty.features",
                    path = %path.display(),
                    "skipping unusable feature descriptor"
                );
            }
        }
    }

    if features.is_empty() {
        return Err(GeneratorError::NoFeatures {
            root: runtime.root().to_path_buf(),
        });
    }

    Ok(FeatureSet::new(
        version.clone(),
        Provenance::Generated,
        features,
    ))
}

fn read_descriptor(path: &Path, version: &RuntimeVersion) -> Option<Feature> {
    let text = std::fs::read_to_string(path).ok()?;
    let manifest = parse_subsystem_manifest(&text);

    let symbolic_name = manifest.symbolic_name()?;

    let kind = if manifest.is_auto_feature() {
        FeatureType::Auto
    } else {
        match manifest.visibility().as_deref() {
            Some("public") => FeatureType::Public,
            _ => return None,
        }
    };

    // Auto features may legitimately lack a short name; public ones must
    // carry one to be typable in configuration.
    let short_name = match manifest.short_name() {
        Some(short) => short.to_string(),
        None if kind == FeatureType::Auto => symbolic_name.to_string(),
        None => return None,
    };

    let description = manifest
        .header("Subsystem-Description")
        .unwrap_or_default()
        .to_string();
    let short_description = manifest
        .header("Subsystem-Name")
        .unwrap_or_default()
        .to_string();

    Some(Feature {
        name: symbolic_name.to_string(),
        short_name,
        description,
        short_description,
        kind,
        license_id: manifest.header("Subsystem-License").map(str::to_string),
        license_type: None,
        version: manifest
            .header("Subsystem-Version")
            .map(str::to_string)
            .unwrap_or_else(|| version.version().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_runtime(dir: &Path) -> InstalledRuntime {
        let features = dir.join("wlp").join("lib").join("features");
        std::fs::create_dir_all(&features).unwrap();

        std::fs::write(
            features.join("com.ibm.websphere.appserver.servlet-3.1.mf"),
            "Subsystem-SymbolicName: com.ibm.websphere.appserver.servlet-3.1; visibility:=public\n\
IBM-ShortName: servlet-3.1\n\
Subsystem-Name: Java Servlets 3.1\n\
Subsystem-Description: Servlet support.\n\
Subsystem-Version: 1.0.0\n",
        )
        .unwrap();
        std::fs::write(
            features.join("com.ibm.websphere.appserver.batch-1.0.mf"),
            "Subsystem-SymbolicName: com.ibm.websphere.appserver.batch-1.0; visibility:=public\n\
IBM-ShortName: batch-1.0\n\
Subsystem-Name: Batch API 1.0\n",
        )
        .unwrap();
        std::fs::write(
            features.join("com.ibm.websphere.appserver.internal-1.0.mf"),
            "Subsystem-SymbolicName: com.ibm.websphere.appserver.internal-1.0; visibility:=private\n",
        )
        .unwrap();
        std::fs::write(features.join("broken.mf"), "not a manifest at all").unwrap();

        InstalledRuntime::from_root(dir.join("wlp")).unwrap()
    }

    fn version() -> RuntimeVersion {
        RuntimeVersion::new("18.0.0.1", liberty_core::Edition::WebSphereLiberty).unwrap()
    }

    #[test]
    fn locates_runtimes_in_known_layouts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("target/liberty/wlp/lib")).unwrap();
        let runtime = InstalledRuntime::locate(tmp.path()).unwrap();
        assert_eq!(runtime.root(), tmp.path().join("target/liberty/wlp"));
        assert!(InstalledRuntime::locate(&tmp.path().join("elsewhere")).is_none());
    }

    #[test]
    fn generates_public_features_and_skips_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = write_runtime(tmp.path());

        let set = generate_feature_list(&runtime, &version()).unwrap();
        assert_eq!(set.provenance(), Provenance::Generated);

        let names: Vec<&str> = set.features().iter().map(|f| f.short_name.as_str()).collect();
        assert_eq!(names, vec!["batch-1.0", "servlet-3.1"]);

        let servlet = set.find("servlet-3.1").unwrap();
        assert_eq!(servlet.short_description, "Java Servlets 3.1");
        assert_eq!(servlet.version, "1.0.0");
    }

    #[test]
    fn generation_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let runtime = write_runtime(tmp.path());

        let first = crate::serialize_feature_list(&generate_feature_list(&runtime, &version()).unwrap());
        let second = crate::serialize_feature_list(&generate_feature_list(&runtime, &version()).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn missing_features_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("wlp/lib")).unwrap();
        let runtime = InstalledRuntime::from_root(tmp.path().join("wlp")).unwrap();
        assert!(matches!(
            generate_feature_list(&runtime, &version()),
            Err(GeneratorError::MissingFeaturesDir { .. })
        ));
    }

    #[test]
    fn reads_version_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let versions = tmp.path().join("wlp/lib/versions");
        std::fs::create_dir_all(&versions).unwrap();
        std::fs::write(
            versions.join("openliberty.properties"),
            "com.ibm.websphere.productId=io.openliberty\n\
com.ibm.websphere.productVersion=23.0.0.3\n",
        )
        .unwrap();

        let runtime = InstalledRuntime::from_root(tmp.path().join("wlp")).unwrap();
        let detected = runtime.version_metadata().unwrap();
        assert_eq!(detected.version(), "23.0.0.3");
        assert_eq!(detected.edition(), liberty_core::Edition::OpenLiberty);
    }
}
