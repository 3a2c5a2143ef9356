//! Runtime version identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version used when detection finds no explicit marker anywhere.
///
/// Completion must keep working for a folder with no installed runtime, so an
/// undetermined version silently resolves to this.
pub const DEFAULT_RUNTIME_VERSION: &str = "24.0.0.6";

/// Which Liberty runtime a version belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Open Liberty (`io.openliberty`).
    OpenLiberty,
    /// WebSphere Liberty (`com.ibm.websphere.appserver`).
    WebSphereLiberty,
}

impl Edition {
    /// Short tag used in cache artifact file names.
    pub const fn tag(self) -> &'static str {
        match self {
            Edition::OpenLiberty => "ol",
            Edition::WebSphereLiberty => "wlp",
        }
    }

    /// Map the `com.ibm.websphere.productId` value from an installed
    /// runtime's version metadata to an edition.
    pub fn from_product_id(product_id: &str) -> Option<Self> {
        match product_id.trim() {
            "io.openliberty" => Some(Edition::OpenLiberty),
            "com.ibm.websphere.appserver" => Some(Edition::WebSphereLiberty),
            _ => None,
        }
    }
}

/// A resolved target runtime version.
///
/// This is the identity key for every cache artifact, so the version string
/// is validated at construction to be safe inside a file name. Immutable once
/// parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeVersion {
    version: String,
    edition: Edition,
}

impl RuntimeVersion {
    /// Parse a version string such as `24.0.0.6`.
    ///
    /// Returns `None` for strings that are empty or contain characters that
    /// are not alphanumeric, `.`, `_`, or `-` (the version participates in
    /// on-disk artifact names).
    pub fn new(version: &str, edition: Edition) -> Option<Self> {
        let version = version.trim();
        if version.is_empty() || version.len() > 64 {
            return None;
        }
        if !version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return None;
        }
        Some(Self {
            version: version.to_string(),
            edition,
        })
    }

    /// The well-defined fallback used when detection is inconclusive.
    pub fn default_version() -> Self {
        Self {
            version: DEFAULT_RUNTIME_VERSION.to_string(),
            edition: Edition::OpenLiberty,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn edition(&self) -> Edition {
        self.edition
    }

    /// `<edition-tag>-<version>`, e.g. `ol-24.0.0.6`.
    ///
    /// External tooling asserts on artifact files derived from this key, so
    /// the format is a contract, not an implementation detail.
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.edition.tag(), self.version)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.edition.tag())
    }
}
