//! Completion and hover builders over resolved feature metadata.
//!
//! This layer is protocol-agnostic: it consumes parsed documents and a
//! [`liberty_resolver::ResolvedFeatures`], and produces `liberty-core`
//! payload types for whatever transport embeds the service.

mod completion;
mod hover;
mod properties;
mod service;

pub use completion::feature_completions;
pub use hover::hover;
pub use properties::{
    key_description, property_completions, property_file_kind, property_hover, valid_values,
    PropertyFileKind,
};
pub use service::{ConfigCompletionParticipant, ConfigHoverParticipant, ConfigLanguageService};
