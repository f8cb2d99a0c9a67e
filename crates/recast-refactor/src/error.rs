use recast_core::{Cancelled, EditError, TextRange};
use recast_index::Visibility;

use crate::signature::MethodId;

/// A condition that aborts the whole operation before any edit is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureConflict {
    MissingTarget(MethodId),
    TargetNotAMethod(MethodId),
    NoChange,
    InvalidMethodName {
        name: String,
    },
    EmptyParameterName {
        position: usize,
    },
    InvalidParameterName {
        name: String,
    },
    DuplicateParameterName {
        name: String,
    },
    InvalidParameterIndex {
        index: usize,
        param_len: usize,
    },
    MalformedType {
        text: String,
    },
    UnresolvedType {
        text: String,
    },
    MalformedDefaultValue {
        parameter: String,
        text: String,
    },
    VarargNotLast {
        name: String,
    },
    MultipleVarargs,
    /// A retained parameter loses its vararg shape while some method in the
    /// override family still declares it vararg.
    VarargDowngradeBlocked {
        name: String,
        method: String,
        file: String,
    },
    /// The new signature collides with an existing sibling overload that has
    /// the exact same parameter type sequence.
    SignatureClash {
        type_name: String,
        method: String,
    },
    /// An occurrence of the method name the classifier could not map to a
    /// known shape. The refactor must not complete around a site it does
    /// not know how to update; callers can opt in to proceeding, which
    /// demotes these to [`SignatureWarning::UnclassifiableOccurrence`].
    UnclassifiableOccurrence {
        file: String,
        range: TextRange,
    },
    OverlappingEdits {
        file: String,
        first: TextRange,
        second: TextRange,
    },
    ParseError {
        file: String,
        context: &'static str,
    },
    Cancelled,
}

/// A condition reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureWarning {
    /// The new method name equals the declaring type's name, which reads
    /// like a constructor.
    MethodNameMatchesType {
        name: String,
    },
    /// A new type text names a type variable that not every member of the
    /// override family declares.
    TypeVariableLeak {
        variable: String,
        method: String,
    },
    /// Reordering the parameters of a `native` method breaks its JNI
    /// counterpart.
    NativeMethodReorder {
        method: String,
        file: String,
    },
    /// A deleted parameter's name still occurs in an affected method body.
    DeletedParameterStillUsed {
        parameter: String,
        method: String,
        file: String,
    },
    /// An occurrence left alone: either the caller opted to proceed past
    /// unclassifiable sites, or a call-shaped site's arity belongs to a
    /// different overload. Never silently dropped.
    UnclassifiableOccurrence {
        file: String,
        range: TextRange,
    },
    /// The declaration was widened past the requested visibility because a
    /// reference requires it.
    VisibilityAdjusted {
        member: String,
        file: String,
        level: Visibility,
    },
    /// The post-edit sanity check found a lexical problem that was not
    /// present before the rewrite. Informational only.
    PostEditProblem {
        file: String,
        detail: String,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("change signature conflicts: {conflicts:?}")]
pub struct SignatureChangeError {
    pub conflicts: Vec<SignatureConflict>,
}

impl From<SignatureConflict> for SignatureChangeError {
    fn from(conflict: SignatureConflict) -> Self {
        SignatureChangeError {
            conflicts: vec![conflict],
        }
    }
}

impl From<Cancelled> for SignatureChangeError {
    fn from(_: Cancelled) -> Self {
        SignatureConflict::Cancelled.into()
    }
}

impl From<EditError> for SignatureChangeError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::OverlappingEdits { file, first, second } => {
                SignatureConflict::OverlappingEdits {
                    file: file.0,
                    first,
                    second,
                }
                .into()
            }
            EditError::InvalidRange { file, .. } | EditError::OutOfBounds { file, .. } => {
                SignatureConflict::ParseError {
                    file: file.0,
                    context: "edit out of bounds",
                }
                .into()
            }
        }
    }
}
