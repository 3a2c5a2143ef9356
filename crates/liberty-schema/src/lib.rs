//! Version-specific schema generation.
//!
//! The generic XML engine validates element nesting and attribute sets
//! against an XSD; this crate derives that XSD from a resolved
//! [`FeatureSet`] so the valid `feature` values (and their hover
//! documentation) track the target runtime version. One schema per feature
//! set; schemas are never merged across versions.

use liberty_features::FeatureSet;

/// Documentation for the server descriptor elements the tooling understands.
///
/// These are version-independent; the version-specific part of the schema is
/// the feature name enumeration.
const ELEMENT_DOCS: &[(&str, &str)] = &[
    ("server", "Defines the configuration of an individual server."),
    ("featureManager", "Defines how the server loads features."),
    (
        "feature",
        "Specifies a feature to be provisioned when the server starts.",
    ),
    (
        "httpEndpoint",
        "Configuration properties for an HTTP endpoint, including host and ports.",
    ),
    (
        "logging",
        "Controls the capture and output of log and trace messages.",
    ),
    (
        "include",
        "Specifies a configuration resource to include in the server configuration.",
    ),
    (
        "variable",
        "Declares a variable that can be referenced elsewhere in the configuration.",
    ),
    (
        "applicationManager",
        "Properties that control the behavior of the application manager.",
    ),
    (
        "webApplication",
        "Defines the properties of a web application deployed to the server.",
    ),
    (
        "keyStore",
        "A repository of security certificates used for SSL encryption.",
    ),
    (
        "basicRegistry",
        "A simple XML-based user and group registry for basic security.",
    ),
];

/// Documentation string for a recognized descriptor element.
pub fn element_documentation(tag: &str) -> Option<&'static str> {
    ELEMENT_DOCS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, doc)| *doc)
}

/// Build the schema document for a resolved feature set.
///
/// The output is deterministic for a given set: element order follows the
/// set's own ordering.
pub fn generate_schema(set: &FeatureSet) -> String {
    let mut out = String::with_capacity(8 * 1024 + set.len() * 256);

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<xsd:schema xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\">\n");

    // Version-specific enumeration of installable feature short names.
    out.push_str("  <xsd:simpleType name=\"featureType\">\n");
    out.push_str("    <xsd:restriction base=\"xsd:string\">\n");
    for feature in set.completion_candidates() {
        out.push_str(&format!(
            "      <xsd:enumeration value=\"{}\">\n",
            escape(&feature.short_name)
        ));
        let documentation = if feature.description.is_empty() {
            &feature.short_description
        } else {
            &feature.description
        };
        push_annotation(&mut out, 8, documentation);
        out.push_str("      </xsd:enumeration>\n");
    }
    out.push_str("    </xsd:restriction>\n");
    out.push_str("  </xsd:simpleType>\n");

    out.push_str("  <xsd:element name=\"featureManager\">\n");
    push_annotation(&mut out, 4, element_documentation("featureManager").unwrap_or_default());
    out.push_str("    <xsd:complexType>\n");
    out.push_str("      <xsd:sequence>\n");
    out.push_str(
        "        <xsd:element name=\"feature\" type=\"featureType\" minOccurs=\"0\" maxOccurs=\"unbounded\">\n",
    );
    push_annotation(&mut out, 10, element_documentation("feature").unwrap_or_default());
    out.push_str("        </xsd:element>\n");
    out.push_str("      </xsd:sequence>\n");
    out.push_str("    </xsd:complexType>\n");
    out.push_str("  </xsd:element>\n");

    out.push_str("  <xsd:element name=\"server\">\n");
    push_annotation(&mut out, 4, element_documentation("server").unwrap_or_default());
    out.push_str("    <xsd:complexType>\n");
    out.push_str("      <xsd:choice minOccurs=\"0\" maxOccurs=\"unbounded\">\n");
    out.push_str("        <xsd:element ref=\"featureManager\"/>\n");
    for (tag, doc) in ELEMENT_DOCS {
        if matches!(*tag, "server" | "featureManager" | "feature") {
            continue;
        }
        out.push_str(&format!(
            "        <xsd:element name=\"{}\" type=\"xsd:anyType\">\n",
            escape(tag)
        ));
        push_annotation(&mut out, 10, doc);
        out.push_str("        </xsd:element>\n");
    }
    out.push_str("      </xsd:choice>\n");
    out.push_str("      <xsd:attribute name=\"description\" type=\"xsd:string\"/>\n");
    out.push_str("    </xsd:complexType>\n");
    out.push_str("  </xsd:element>\n");

    out.push_str("</xsd:schema>\n");
    out
}

fn push_annotation(out: &mut String, indent: usize, documentation: &str) {
    let pad = " ".repeat(indent);
    out.push_str(&format!("{pad}<xsd:annotation>\n"));
    out.push_str(&format!(
        "{pad}  <xsd:documentation>{}</xsd:documentation>\n",
        escape(documentation)
    ));
    out.push_str(&format!("{pad}</xsd:annotation>\n"));
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
