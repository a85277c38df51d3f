//! High-level interface for Entangled operations.

mod context;
mod document;
mod sync_decision;

pub use context::Context;
pub use document::{
    locate_source, stitch_documents, stitch_files, sync_documents, tangle_documents, tangle_files,
    Document, SourceLocation,
};
pub use sync_decision::{sync_action, SyncAction};
