//! The generated `featurelist-<tag>-<version>.xml` artifact.
//!
//! Serialization is deterministic: the set's case-folded short-name order is
//! the document order, so identical installation contents produce
//! byte-identical artifacts across runs.

use liberty_core::RuntimeVersion;

use crate::model::{Feature, FeatureParseError, FeatureSet, FeatureType, Provenance};

/// Serialize a feature set into the feature-list XML document.
pub fn serialize_feature_list(set: &FeatureSet) -> String {
    let mut out = String::with_capacity(set.len() * 256);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<featureInfo name=\"{}\">\n",
        escape(&set.version().cache_key())
    ));

    for feature in set.features() {
        out.push_str(&format!("  <feature name=\"{}\">\n", escape(&feature.name)));
        push_child(&mut out, "shortName", &feature.short_name);
        push_child(&mut out, "description", &feature.description);
        push_child(&mut out, "shortDescription", &feature.short_description);
        push_child(&mut out, "type", feature.kind.as_str());
        if let Some(license_id) = &feature.license_id {
            push_child(&mut out, "licenseId", license_id);
        }
        if let Some(license_type) = &feature.license_type {
            push_child(&mut out, "licenseType", license_type);
        }
        push_child(&mut out, "version", &feature.version);
        out.push_str("  </feature>\n");
    }

    out.push_str("</featureInfo>\n");
    out
}

/// Parse a feature-list artifact back into a feature set.
///
/// Used when a cached `generated` entry is reloaded in a later session.
pub fn parse_feature_list(
    text: &str,
    version: &RuntimeVersion,
) -> Result<FeatureSet, FeatureParseError> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "featureInfo" {
        return Err(FeatureParseError::UnexpectedRoot {
            found: root.tag_name().name().to_string(),
        });
    }

    let mut features = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("feature")) {
        let Some(short_name) = child_text(&node, "shortName") else {
            continue;
        };

        features.push(Feature {
            name: node
                .attribute("name")
                .map(str::to_string)
                .unwrap_or_else(|| short_name.clone()),
            short_name,
            description: child_text(&node, "description").unwrap_or_default(),
            short_description: child_text(&node, "shortDescription").unwrap_or_default(),
            kind: child_text(&node, "type")
                .as_deref()
                .and_then(FeatureType::from_str)
                .unwrap_or(FeatureType::Public),
            license_id: child_text(&node, "licenseId"),
            license_type: child_text(&node, "licenseType"),
            version: child_text(&node, "version")
                .unwrap_or_else(|| version.version().to_string()),
        });
    }

    if features.is_empty() {
        return Err(FeatureParseError::Empty);
    }

    Ok(FeatureSet::new(
        version.clone(),
        Provenance::Generated,
        features,
    ))
}

fn child_text(node: &roxmltree::Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn push_child(out: &mut String, tag: &str, value: &str) {
    out.push_str(&format!("    <{tag}>{}</{tag}>\n", escape(value)));
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
