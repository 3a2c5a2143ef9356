//! Hover for the server descriptor, with artifact citations.

use std::path::Path;

use liberty_core::{HoverContent, LineIndex, TextSize};
use liberty_resolver::ResolvedFeatures;
use liberty_schema::element_documentation;
use liberty_xml::XmlDocument;

/// Build hover content for the position at `offset`.
///
/// Element tag names are documented from the schema table and cite the
/// schema artifact; feature short names are documented from the resolved set
/// and cite the feature-list artifact. Unrecognized tokens return nothing.
pub fn hover(doc: &XmlDocument, offset: TextSize, resolved: &ResolvedFeatures) -> Option<HoverContent> {
    if !doc.is_server_descriptor() {
        return None;
    }

    let element = doc.element_at(offset)?;
    let index = LineIndex::new(doc.text());

    let tag_name_range = doc.tag_name_range(element);
    if tag_name_range.contains_inclusive(offset) {
        let documentation = element_documentation(doc.tag(element))?;
        return Some(HoverContent {
            value: with_citation(documentation, &resolved.schema_path),
            range: Some(index.range(doc.text(), tag_name_range)),
        });
    }

    if doc.tag(element) == "feature" {
        let inner = doc.inner_span(element)?;
        if inner.contains_inclusive(offset) {
            let token = doc.element_text(element).trim();
            if token.is_empty() {
                return None;
            }
            let feature = resolved.set.find(token)?;
            let documentation = if feature.description.is_empty() {
                &feature.short_description
            } else {
                &feature.description
            };
            return Some(HoverContent {
                value: with_citation(documentation, &resolved.feature_list_path),
                range: Some(index.range(doc.text(), inner)),
            });
        }
    }

    None
}

/// `<documentation>\n\nSource: [<artifact-name>](<artifact-uri>)`.
fn with_citation(documentation: &str, artifact: &Path) -> String {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{documentation}\n\nSource: [{name}]({})", file_uri(artifact))
}

fn file_uri(path: &Path) -> String {
    let mut text = path.display().to_string().replace('\\', "/");
    if !text.starts_with('/') {
        text.insert(0, '/');
    }
    format!("file://{text}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use liberty_core::{Edition, RuntimeVersion};
    use liberty_features::{Feature, FeatureSet, FeatureType, Provenance};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    pub(crate) fn resolved_fixture(short_names: &[&str]) -> ResolvedFeatures {
        let version = RuntimeVersion::new("24.0.0.6", Edition::OpenLiberty).unwrap();
        let features = short_names
            .iter()
            .map(|short| Feature {
                name: format!("io.openliberty.features.{short}"),
                short_name: short.to_string(),
                description: format!("Support for {short}."),
                short_description: short.to_string(),
                kind: FeatureType::Public,
                license_id: None,
                license_type: None,
                version: version.version().to_string(),
            })
            .collect();

        ResolvedFeatures {
            set: FeatureSet::new(version, Provenance::Remote, features),
            feature_list_path: PathBuf::from("/work/app/.libertyls/features-ol-24.0.0.6.json"),
            schema_path: PathBuf::from("/work/app/.libertyls/ol-24.0.0.6.xsd"),
            persisted: true,
            feature_list_bytes: Vec::new(),
            schema_bytes: Vec::new(),
        }
    }

    const SERVER_XML: &str = "<server description=\"Sample Liberty server\">\n    <featureManager>\n        <feature>jaxrs-2.1</feature>\n    </featureManager>\n</server>\n";

    #[test]
    fn element_hover_cites_the_schema_artifact() {
        let doc = XmlDocument::parse(SERVER_XML).unwrap();
        let offset = TextSize::from((SERVER_XML.find("featureManager").unwrap() + 3) as u32);
        let resolved = resolved_fixture(&["jaxrs-2.1"]);

        let hover = hover(&doc, offset, &resolved).unwrap();
        assert_eq!(
            hover.value,
            "Defines how the server loads features.\n\n\
Source: [ol-24.0.0.6.xsd](file:///work/app/.libertyls/ol-24.0.0.6.xsd)"
        );
    }

    #[test]
    fn feature_hover_cites_the_feature_list_artifact() {
        let doc = XmlDocument::parse(SERVER_XML).unwrap();
        let offset = TextSize::from(SERVER_XML.find("jaxrs").unwrap() as u32);
        let resolved = resolved_fixture(&["jaxrs-2.1"]);

        let hover = hover(&doc, offset, &resolved).unwrap();
        assert!(hover.value.starts_with("Support for jaxrs-2.1."));
        assert!(hover
            .value
            .ends_with("Source: [features-ol-24.0.0.6.json](file:///work/app/.libertyls/features-ol-24.0.0.6.json)"));
    }

    #[test]
    fn feature_hover_matches_case_insensitively() {
        let text = SERVER_XML.replace("jaxrs-2.1", "JAXRS-2.1");
        let doc = XmlDocument::parse(&text).unwrap();
        let offset = TextSize::from(text.find("JAXRS").unwrap() as u32);
        let resolved = resolved_fixture(&["jaxrs-2.1"]);
        assert!(hover(&doc, offset, &resolved).is_some());
    }

    #[test]
    fn unknown_tokens_return_nothing() {
        let text = SERVER_XML.replace("jaxrs-2.1", "not-a-feature");
        let doc = XmlDocument::parse(&text).unwrap();
        let offset = TextSize::from(text.find("not-a-feature").unwrap() as u32);
        let resolved = resolved_fixture(&["jaxrs-2.1"]);
        assert_eq!(hover(&doc, offset, &resolved), None);
    }

    #[test]
    fn undocumented_elements_return_nothing() {
        let text = "<server>\n  <mystery/>\n</server>\n";
        let doc = XmlDocument::parse(text).unwrap();
        let offset = TextSize::from(text.find("mystery").unwrap() as u32);
        let resolved = resolved_fixture(&[]);
        assert_eq!(hover(&doc, offset, &resolved), None);
    }
}
