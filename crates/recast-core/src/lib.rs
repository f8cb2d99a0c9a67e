//! Core shared types for Recast.
//!
//! This crate is intentionally small: text ranges, file identifiers, the
//! workspace edit model, and cooperative cancellation. Everything else lives
//! in `recast-index` (source model) and `recast-refactor` (the engine).

mod cancel;
mod edit;
mod text;

pub use cancel::{Cancelled, CancellationToken};
pub use edit::{apply_text_edits, EditError, FileId, TextEdit, WorkspaceEdit};
pub use text::TextRange;
