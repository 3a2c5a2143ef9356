//! Parser for the published `features-<version>.json` registry artifact.
//!
//! Parsing is explicit and field-by-field: a record missing its short name
//! is skipped, every other missing field gets a defined default. A single
//! malformed record never fails the whole artifact.

use liberty_core::RuntimeVersion;
use serde_json::Value;

use crate::model::{Feature, FeatureParseError, FeatureSet, FeatureType, Provenance};

/// Parse the raw bytes of a published feature-list artifact.
pub fn parse_features_json(
    bytes: &[u8],
    version: &RuntimeVersion,
) -> Result<FeatureSet, FeatureParseError> {
    let root: Value = serde_json::from_slice(bytes)?;

    let Some(records) = root.as_array() else {
        return Err(FeatureParseError::Empty);
    };

    let mut features = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for record in records {
        match parse_record(record, version) {
            Some(feature) => features.push(feature),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(
            target = "liberty.features",
            skipped,
            total = records.len(),
            version = %version,
            "skipped feature records without a usable short name"
        );
    }

    if features.is_empty() {
        return Err(FeatureParseError::Empty);
    }

    Ok(FeatureSet::new(
        version.clone(),
        Provenance::Remote,
        features,
    ))
}

fn parse_record(record: &Value, version: &RuntimeVersion) -> Option<Feature> {
    let info = record.get("wlpInformation");
    let short_name = info
        .and_then(|i| i.get("shortName"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    let kind = info
        .and_then(|i| i.get("visibility"))
        .and_then(Value::as_str)
        .map(|v| match v.to_ascii_uppercase().as_str() {
            "PUBLIC" => FeatureType::Public,
            "AUTO" => FeatureType::Auto,
            _ => FeatureType::Private,
        })
        .unwrap_or(FeatureType::Public);

    Some(Feature {
        name: string_field(record, "name").unwrap_or_else(|| short_name.to_string()),
        short_name: short_name.to_string(),
        description: string_field(record, "description").unwrap_or_default(),
        short_description: string_field(record, "shortDescription").unwrap_or_default(),
        kind,
        license_id: string_field(record, "licenseId"),
        license_type: string_field(record, "licenseType"),
        version: string_field(record, "version").unwrap_or_else(|| version.version().to_string()),
    })
}

fn string_field(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
