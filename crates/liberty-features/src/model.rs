//! Feature and feature-set data model.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use liberty_core::RuntimeVersion;
use thiserror::Error;

/// Errors from the artifact parsers in this crate.
#[derive(Debug, Error)]
pub enum FeatureParseError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("feature list artifact has unexpected root element `{found}`")]
    UnexpectedRoot { found: String },

    #[error("feature list artifact contained no usable features")]
    Empty,
}

/// Visibility class of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    /// Installable and referenced by short name in `featureManager`.
    Public,
    /// Internal building block, never completed.
    Private,
    /// Provisioned automatically when its capability condition holds.
    Auto,
}

impl FeatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Public => "public",
            FeatureType::Private => "private",
            FeatureType::Auto => "auto",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(FeatureType::Public),
            "private" => Some(FeatureType::Private),
            "auto" => Some(FeatureType::Auto),
            _ => None,
        }
    }
}

/// One installable capability unit of the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Symbolic name, e.g. `com.ibm.websphere.appserver.servlet-3.1`.
    pub name: String,
    /// The value users type, e.g. `servlet-3.1`. Identity within a set.
    pub short_name: String,
    pub description: String,
    pub short_description: String,
    pub kind: FeatureType,
    pub license_id: Option<String>,
    pub license_type: Option<String>,
    /// Version of the runtime this feature record belongs to.
    pub version: String,
}

/// Origin of a resolved [`FeatureSet`].
///
/// Governs trust and re-resolution policy: remote and bundled sets are
/// authoritative, generated sets are best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Remote,
    Generated,
    BundledDefault,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Remote => "remote",
            Provenance::Generated => "generated",
            Provenance::BundledDefault => "bundled-default",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "remote" => Some(Provenance::Remote),
            "generated" => Some(Provenance::Generated),
            "bundled-default" => Some(Provenance::BundledDefault),
            _ => None,
        }
    }

    /// Trusted sets are never re-fetched within a session.
    pub fn is_authoritative(self) -> bool {
        matches!(self, Provenance::Remote | Provenance::BundledDefault)
    }
}

/// The resolved, ordered collection of features for one runtime version.
///
/// Features are held in case-folded lexicographic short-name order and short
/// names are unique within the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    version: RuntimeVersion,
    provenance: Provenance,
    generated_at_millis: u64,
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(version: RuntimeVersion, provenance: Provenance, features: Vec<Feature>) -> Self {
        let mut features = features;
        features.sort_by(|a, b| {
            let folded = a
                .short_name
                .to_ascii_lowercase()
                .cmp(&b.short_name.to_ascii_lowercase());
            folded.then_with(|| a.short_name.cmp(&b.short_name))
        });
        features.dedup_by(|a, b| a.short_name.eq_ignore_ascii_case(&b.short_name));

        Self {
            version,
            provenance,
            generated_at_millis: now_millis(),
            features,
        }
    }

    pub fn version(&self) -> &RuntimeVersion {
        &self.version
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn generated_at_millis(&self) -> u64 {
        self.generated_at_millis
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Features offered as completion candidates.
    pub fn completion_candidates(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(|f| f.kind == FeatureType::Public)
    }

    /// Case-insensitive lookup by short name.
    pub fn find(&self, short_name: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.short_name.eq_ignore_ascii_case(short_name))
    }
}

pub(crate) fn now_millis() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as u64,
        Err(err) => {
            // System clock before the epoch; log at most once.
            static REPORTED: OnceLock<()> = OnceLock::new();
            if REPORTED.set(()).is_ok() {
                tracing::debug!(
                    target = "liberty.features",
                    error = %err,
                    "system time is before unix epoch; using 0 for now_millis"
                );
            }
            0
        }
    }
}
