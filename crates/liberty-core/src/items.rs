//! Payload types handed to the embedding editor integration.

use crate::text::TextEdit;

/// A single completion proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub detail: Option<String>,
    /// Markdown shown in the completion detail pane.
    pub documentation: Option<String>,
    /// Edit applied when the item is accepted. When absent the client inserts
    /// the label at the cursor.
    pub text_edit: Option<TextEdit>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
            documentation: None,
            text_edit: None,
        }
    }
}

/// Hover payload: markdown plus the range it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverContent {
    pub value: String,
    pub range: Option<crate::text::Range>,
}
