//! Change Method Signature for Java sources.
//!
//! Given a resolved method and a requested new signature (name, return
//! type, visibility, reordered parameter list, exception list, delegate
//! flags), the engine locates every syntactic occurrence across the indexed
//! codebase and produces one all-or-nothing [`recast_core::WorkspaceEdit`].

mod advisor;
mod constructors;
mod context;
mod descriptor;
mod engine;
mod error;
mod hierarchy;
mod java;
mod javadoc;
mod occurrence;
mod postcheck;
mod preview;
mod reshuffle;
mod signature;
mod update;
mod validate;
mod visibility;

pub use advisor::{AdvisorContext, DefaultValueAdvisor};
pub use descriptor::SignatureChangeDescriptor;
pub use engine::{change_signature, replay, ChangeSignatureOptions, SignatureChangeOutcome};
pub use error::{SignatureChangeError, SignatureConflict, SignatureWarning};
pub use hierarchy::HierarchyCache;
pub use occurrence::{Occurrence, OccurrenceKind};
pub use preview::{generate_preview, FilePreview, RefactoringPreview};
pub use signature::{
    ExceptionChange, MethodId, MethodSignatureChange, ParameterChange, ValidationState,
};

pub use recast_core::{CancellationToken, FileId, TextEdit, TextRange, WorkspaceEdit};
pub use recast_index::{Index, Visibility};
