//! Feature and schema resolution.
//!
//! [`WorkspaceContext`] is the explicit per-process state: a mapping from
//! workspace folder identity to its cache and resolved versions, constructed
//! at startup and dropped at teardown. `resolve_folder` /
//! `resolve_document` are the single entry points consumers use; resolution
//! is total: it always produces a feature set, degrading from remote
//! through locally generated down to the bundled default.

mod context;
mod detect;

pub use context::{ResolvedFeatures, WorkspaceContext};
pub use detect::detect_version;
