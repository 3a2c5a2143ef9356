//! Feature metadata for the Liberty runtime.
//!
//! A [`FeatureSet`] is the resolved collection of installable features for
//! one runtime version, assembled from one of three sources: the published
//! registry artifact (`features-<version>.json`), a feature list generated
//! from a locally installed runtime's subsystem manifests, or the bundled
//! default set shipped with the tool.

mod bundled;
mod featurelist;
mod generator;
mod json;
mod manifest;
mod model;

pub use bundled::{bundled_default_set, bundled_features_json};
pub use featurelist::{parse_feature_list, serialize_feature_list};
pub use generator::{generate_feature_list, GeneratorError, InstalledRuntime};
pub use json::parse_features_json;
pub use manifest::{parse_subsystem_manifest, SubsystemManifest};
pub use model::{Feature, FeatureParseError, FeatureSet, FeatureType, Provenance};
