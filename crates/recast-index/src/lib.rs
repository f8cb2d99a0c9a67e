//! Best-effort lexical symbol discovery for Java sources.
//!
//! This crate intentionally favors recall over precision: it sketches enough
//! structure (types, members, imports, hierarchy edges) for the refactoring
//! engine to locate and classify occurrences, and the engine follows up with
//! its own verification passes.

mod index;
mod scan;
mod sketch;
mod symbols;

pub use index::Index;
pub use scan::{
    eq_ignore_ascii_ws, find_identifier, find_identifier_occurrences, find_matching_brace,
    find_matching_paren, is_ident_continue, is_ident_start, split_top_level,
    split_top_level_ranges, IdentOccurrence,
};
pub use symbols::{
    ImportDecl, MethodDetails, ParamSketch, ReferenceCandidate, ReferenceKind, Symbol, SymbolId,
    SymbolKind, TypeKind, Visibility,
};

pub use recast_core::TextRange;
