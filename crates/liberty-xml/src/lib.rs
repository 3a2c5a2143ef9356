//! Byte-offset-preserving document model for the server descriptor.
//!
//! `roxmltree` borrows the input text, so the parse result is flattened into
//! an owned element table indexed by [`ElementId`]. The table keeps the byte
//! spans completion and hover need: the tag name inside the start tag, and
//! the inner span between start-tag close and end-tag open that a feature
//! completion edit replaces.

use liberty_core::{TextRange, TextSize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml parse error: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Index into the document's element table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

#[derive(Debug)]
struct ElementData {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: Vec<(String, String)>,
    /// Whole element, `<` through the closing `>`.
    range: TextRange,
    /// The tag name inside the start tag.
    tag_name_range: TextRange,
    /// Between start-tag close and end-tag open. `None` for self-closing
    /// elements.
    inner_range: Option<TextRange>,
    /// Concatenated direct text children.
    text: String,
}

#[derive(Debug)]
pub struct XmlDocument {
    text: String,
    elements: Vec<ElementData>,
    root: Option<ElementId>,
}

impl XmlDocument {
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let doc = roxmltree::Document::parse(text)?;

        let mut elements = Vec::new();
        let root = collect(text, doc.root_element(), None, &mut elements);

        Ok(Self {
            text: text.to_string(),
            elements,
            root: Some(root),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Whether this document looks like a server descriptor.
    pub fn is_server_descriptor(&self) -> bool {
        self.root.is_some_and(|r| self.tag(r) == "server")
    }

    pub fn tag(&self, id: ElementId) -> &str {
        &self.elements[id.0].tag
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements[id.0].parent
    }

    pub fn children(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.elements[id.0].children.iter().copied()
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements[id.0]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated direct text content, whitespace preserved.
    pub fn element_text(&self, id: ElementId) -> &str {
        &self.elements[id.0].text
    }

    pub fn range(&self, id: ElementId) -> TextRange {
        self.elements[id.0].range
    }

    pub fn tag_name_range(&self, id: ElementId) -> TextRange {
        self.elements[id.0].tag_name_range
    }

    /// Span between the start tag's `>` and the end tag's `</`.
    pub fn inner_span(&self, id: ElementId) -> Option<TextRange> {
        self.elements[id.0].inner_range
    }

    /// Deepest element whose range contains `offset`.
    pub fn element_at(&self, offset: TextSize) -> Option<ElementId> {
        let mut current = self.root.filter(|r| self.contains(*r, offset))?;
        'descend: loop {
            for child in self.elements[current.0].children.iter().copied() {
                if self.contains(child, offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    fn contains(&self, id: ElementId, offset: TextSize) -> bool {
        self.elements[id.0].range.contains_inclusive(offset)
    }
}

fn collect(
    text: &str,
    node: roxmltree::Node<'_, '_>,
    parent: Option<ElementId>,
    elements: &mut Vec<ElementData>,
) -> ElementId {
    let range = node.range();
    let tag = node.tag_name().name().to_string();

    let id = ElementId(elements.len());
    elements.push(ElementData {
        tag_name_range: tag_name_range(range.start, &tag),
        inner_range: inner_range(text, range.clone(), &tag),
        tag,
        parent,
        children: Vec::new(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        range: TextRange::new(
            TextSize::from(range.start as u32),
            TextSize::from(range.end as u32),
        ),
        text: node
            .children()
            .filter(|c| c.is_text())
            .filter_map(|c| c.text())
            .collect(),
    });

    let children: Vec<ElementId> = node
        .children()
        .filter(|c| c.is_element())
        .map(|c| collect(text, c, Some(id), elements))
        .collect();
    elements[id.0].children = children;

    id
}

fn tag_name_range(element_start: usize, tag: &str) -> TextRange {
    // The start tag is `<name ...`; namespaces are not used in server
    // descriptors, so the name begins right after `<`.
    let start = element_start + 1;
    TextRange::new(
        TextSize::from(start as u32),
        TextSize::from((start + tag.len()) as u32),
    )
}

fn inner_range(text: &str, range: std::ops::Range<usize>, tag: &str) -> Option<TextRange> {
    let slice = &text[range.clone()];

    let close = start_tag_close(slice)?;
    if slice.as_bytes().get(close.checked_sub(1)?) == Some(&b'/') {
        // Self-closing.
        return None;
    }

    let end_tag = format!("</{tag}");
    let end_open = slice.rfind(&end_tag)?;
    if end_open < close {
        return None;
    }

    Some(TextRange::new(
        TextSize::from((range.start + close + 1) as u32),
        TextSize::from((range.start + end_open) as u32),
    ))
}

/// Offset of the `>` terminating the start tag, quote-aware.
fn start_tag_close(slice: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, &b) in slice.as_bytes().iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}
