//! Feature completion for the server descriptor.

use liberty_core::{CompletionItem, LineIndex, TextEdit, TextSize};
use liberty_resolver::ResolvedFeatures;
use liberty_xml::{ElementId, XmlDocument};

const FEATURE_ELEMENT: &str = "feature";
const FEATURE_MANAGER_ELEMENT: &str = "featureManager";

/// Build feature completions for the `<feature>` element at `offset`.
///
/// Every feature in the resolved set is offered except those already
/// declared as siblings in the enclosing `featureManager` block; each item
/// carries an edit that replaces the element's inner text span with the
/// short name. Returns an empty list when the cursor is not inside a
/// feature element.
pub fn feature_completions(
    doc: &XmlDocument,
    offset: TextSize,
    resolved: &ResolvedFeatures,
) -> Vec<CompletionItem> {
    if !doc.is_server_descriptor() {
        return Vec::new();
    }

    let Some(feature_element) = feature_element_at(doc, offset) else {
        return Vec::new();
    };
    let Some(inner) = doc.inner_span(feature_element) else {
        return Vec::new();
    };

    let declared = declared_sibling_features(doc, feature_element);

    let index = LineIndex::new(doc.text());
    let edit_range = index.range(doc.text(), inner);

    resolved
        .set
        .completion_candidates()
        .filter(|feature| {
            !declared
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(&feature.short_name))
        })
        .map(|feature| CompletionItem {
            label: feature.short_name.clone(),
            detail: None,
            documentation: Some(feature.short_description.clone()),
            text_edit: Some(TextEdit::new(edit_range, feature.short_name.clone())),
        })
        .collect()
}

/// The `feature` element the cursor sits in, when its parent is a
/// `featureManager` block.
fn feature_element_at(doc: &XmlDocument, offset: TextSize) -> Option<ElementId> {
    let element = doc.element_at(offset)?;
    if doc.tag(element) != FEATURE_ELEMENT {
        return None;
    }
    let parent = doc.parent(element)?;
    (doc.tag(parent) == FEATURE_MANAGER_ELEMENT).then_some(element)
}

/// Feature short names already declared in the enclosing block.
///
/// Elements without text content (still being typed, or holding only
/// comments) are skipped.
fn declared_sibling_features(doc: &XmlDocument, feature_element: ElementId) -> Vec<String> {
    let Some(manager) = doc.parent(feature_element) else {
        return Vec::new();
    };

    doc.children(manager)
        .filter(|child| *child != feature_element)
        .filter(|child| doc.tag(*child) == FEATURE_ELEMENT)
        .map(|child| doc.element_text(child).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
