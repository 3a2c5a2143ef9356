//! The registration surface for host editor engines.
//!
//! Host processes discover completion/hover participants through narrow
//! traits; [`ConfigLanguageService`] implements them over a
//! [`WorkspaceContext`] and is registered once at startup. The resolution
//! logic itself stays independent of the registration mechanism.

use std::path::Path;
use std::sync::Arc;

use liberty_core::{CompletionItem, HoverContent, TextSize};
use liberty_resolver::WorkspaceContext;
use liberty_xml::XmlDocument;

use crate::completion::feature_completions;
use crate::hover::hover;
use crate::properties::{property_completions, property_file_kind, property_hover};

/// Completion participant for server descriptor documents.
pub trait ConfigCompletionParticipant: Send + Sync {
    fn on_completion(
        &self,
        document_path: &Path,
        doc: &XmlDocument,
        offset: TextSize,
    ) -> Vec<CompletionItem>;
}

/// Hover participant for server descriptor documents.
pub trait ConfigHoverParticipant: Send + Sync {
    fn on_hover(
        &self,
        document_path: &Path,
        doc: &XmlDocument,
        offset: TextSize,
    ) -> Option<HoverContent>;
}

/// The one object a host registers: routes descriptor requests through
/// resolution and serves property files directly.
pub struct ConfigLanguageService {
    context: Arc<WorkspaceContext>,
}

impl ConfigLanguageService {
    pub fn new(context: Arc<WorkspaceContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<WorkspaceContext> {
        &self.context
    }

    /// Value completions for `bootstrap.properties` / `server.env`
    /// documents. Returns an empty list for other files.
    pub fn property_completions_at(
        &self,
        document_path: &Path,
        text: &str,
        offset: TextSize,
    ) -> Vec<CompletionItem> {
        match property_file_kind(document_path) {
            Some(kind) => property_completions(text, kind, offset),
            None => Vec::new(),
        }
    }

    /// Key hover for `bootstrap.properties` / `server.env` documents.
    pub fn property_hover_at(
        &self,
        document_path: &Path,
        text: &str,
        offset: TextSize,
    ) -> Option<HoverContent> {
        let kind = property_file_kind(document_path)?;
        property_hover(text, kind, offset)
    }
}

impl ConfigCompletionParticipant for ConfigLanguageService {
    fn on_completion(
        &self,
        document_path: &Path,
        doc: &XmlDocument,
        offset: TextSize,
    ) -> Vec<CompletionItem> {
        if !doc.is_server_descriptor() {
            return Vec::new();
        }
        let resolved = self.context.resolve_document(document_path);
        feature_completions(doc, offset, &resolved)
    }
}

impl ConfigHoverParticipant for ConfigLanguageService {
    fn on_hover(
        &self,
        document_path: &Path,
        doc: &XmlDocument,
        offset: TextSize,
    ) -> Option<HoverContent> {
        if !doc.is_server_descriptor() {
            return None;
        }
        let resolved = self.context.resolve_document(document_path);
        hover(doc, offset, &resolved)
    }
}
