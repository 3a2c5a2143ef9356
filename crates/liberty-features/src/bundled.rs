//! The bundled default feature set.
//!
//! The floor of the resolution fallback chain: when a version has no
//! published artifact and no local installation, completion still offers
//! this set rather than nothing.

use liberty_core::RuntimeVersion;

use crate::json::parse_features_json;
use crate::model::{FeatureSet, Provenance};

const DEFAULT_FEATURES_JSON: &str = include_str!("../assets/features-default.json");

/// Raw bytes of the bundled artifact, in the registry JSON format.
///
/// Persisted as the cache artifact backing a bundled-default resolution.
pub fn bundled_features_json() -> &'static str {
    DEFAULT_FEATURES_JSON
}

/// Build the bundled default set for the given version.
///
/// The bundled artifact ships in the registry JSON format; the caller's
/// version is stamped onto the set so its cache artifacts stay
/// version-qualified.
pub fn bundled_default_set(version: &RuntimeVersion) -> FeatureSet {
    let parsed = parse_features_json(DEFAULT_FEATURES_JSON.as_bytes(), version)
        .expect("bundled feature artifact is valid");
    FeatureSet::new(
        version.clone(),
        Provenance::BundledDefault,
        parsed.features().to_vec(),
    )
}
