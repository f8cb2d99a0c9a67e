//! The change request model: what the caller wants the method to look like.

use recast_index::{Index, SymbolKind, Visibility};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{SignatureChangeError, SignatureConflict};

/// Stable handle for a method declaration inside an [`Index`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct MethodId(pub u32);

impl From<recast_index::SymbolId> for MethodId {
    fn from(id: recast_index::SymbolId) -> Self {
        MethodId(id.0)
    }
}

impl MethodId {
    pub fn symbol_id(self) -> recast_index::SymbolId {
        recast_index::SymbolId(self.0)
    }
}

/// How far validation has gotten. A change starts `Unchecked`, becomes
/// `SyntaxChecked` once its texts are lexically sound, and `FullyResolved`
/// once types have been checked against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationState {
    #[default]
    Unchecked,
    SyntaxChecked,
    FullyResolved,
}

/// One entry in the new parameter list, in the requested (new) order.
///
/// `old_index: None` marks an added parameter. Deleted parameters stay in
/// the list with `deleted: true` so a replayed change carries the full plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterChange {
    pub old_index: Option<usize>,
    pub old_name: Option<String>,
    pub new_name: String,
    pub old_type: Option<String>,
    pub new_type: String,
    pub is_old_varargs: bool,
    pub is_new_varargs: bool,
    /// Expression inserted at updated call sites for an added parameter.
    ///
    /// Java has no default parameters; this is the call-site default. An
    /// added trailing vararg with no default contributes no argument at all.
    pub default_value: Option<String>,
    pub deleted: bool,
}

impl ParameterChange {
    /// A parameter carried over from the old signature unchanged.
    pub fn keep(old_index: usize, ty: &str, name: &str, is_varargs: bool) -> Self {
        ParameterChange {
            old_index: Some(old_index),
            old_name: Some(name.to_string()),
            new_name: name.to_string(),
            old_type: Some(ty.to_string()),
            new_type: ty.to_string(),
            is_old_varargs: is_varargs,
            is_new_varargs: is_varargs,
            default_value: None,
            deleted: false,
        }
    }

    pub fn add(ty: &str, name: &str, default_value: Option<&str>) -> Self {
        ParameterChange {
            old_index: None,
            old_name: None,
            new_name: name.to_string(),
            old_type: None,
            new_type: ty.to_string(),
            is_old_varargs: false,
            is_new_varargs: ty.trim_end().ends_with("..."),
            default_value: default_value.map(str::to_string),
            deleted: false,
        }
    }

    pub fn renamed(mut self, name: &str) -> Self {
        self.new_name = name.to_string();
        self
    }

    pub fn retyped(mut self, ty: &str) -> Self {
        self.new_type = ty.to_string();
        self.is_new_varargs = ty.trim_end().ends_with("...");
        self
    }

    pub fn delete(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn is_added(&self) -> bool {
        self.old_index.is_none() && !self.deleted
    }

    pub fn is_renamed(&self) -> bool {
        self.old_name.as_deref() != Some(self.new_name.as_str())
    }

    pub fn is_retyped(&self) -> bool {
        self.old_type.as_deref() != Some(self.new_type.as_str())
    }
}

/// One entry in the exception list. Matching is by type text with a
/// simple-name fallback when either side is unqualified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ExceptionChange {
    Keep { ty: String },
    Add { ty: String },
    Delete { ty: String },
}

impl ExceptionChange {
    pub fn ty(&self) -> &str {
        match self {
            ExceptionChange::Keep { ty }
            | ExceptionChange::Add { ty }
            | ExceptionChange::Delete { ty } => ty,
        }
    }
}

/// Whether two exception type texts denote the same type, as far as a
/// lexical engine can tell.
pub(crate) fn same_exception_type(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a == b {
        return true;
    }
    let simple = |t: &str| t.rsplit('.').next().unwrap_or(t).to_string();
    if a.contains('.') && b.contains('.') {
        return false;
    }
    simple(a) == simple(b)
}

/// The full requested signature change, in terms of the old declaration.
///
/// Built from the current declaration with [`MethodSignatureChange::from_declaration`],
/// then mutated to describe the desired outcome, then handed to
/// [`change_signature`](crate::change_signature).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MethodSignatureChange {
    pub target: MethodId,
    pub old_name: String,
    pub new_name: String,
    /// `None` for constructors.
    pub old_return_type: Option<String>,
    pub new_return_type: Option<String>,
    pub old_visibility: Visibility,
    pub new_visibility: Visibility,
    /// New parameter order; deleted parameters stay in place with a flag.
    pub parameters: Vec<ParameterChange>,
    pub exceptions: Vec<ExceptionChange>,
    /// Keep a forwarding method with the old signature.
    pub delegate: bool,
    /// Mark the forwarding method `@Deprecated`.
    pub deprecate_delegate: bool,
    #[serde(skip)]
    #[schemars(skip)]
    pub state: ValidationState,
}

impl MethodSignatureChange {
    /// Seed a change from the target's current declaration: every field set
    /// to "no change" so callers only mutate what they mean to alter.
    pub fn from_declaration(index: &Index, target: MethodId) -> Result<Self, SignatureChangeError> {
        let Some(symbol) = index.symbol(target.symbol_id()) else {
            return Err(SignatureChangeError::from(SignatureConflict::MissingTarget(
                target,
            )));
        };
        if symbol.kind != SymbolKind::Method {
            return Err(SignatureChangeError::from(
                SignatureConflict::TargetNotAMethod(target),
            ));
        }
        let Some(details) = index.method_details(symbol.id) else {
            return Err(SignatureChangeError::from(SignatureConflict::ParseError {
                file: symbol.file.clone(),
                context: "missing method details",
            }));
        };

        let parameters = details
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| ParameterChange::keep(i, &p.ty, &p.name, p.is_varargs))
            .collect();
        let exceptions = details
            .throws
            .iter()
            .map(|ty| ExceptionChange::Keep { ty: ty.clone() })
            .collect();

        Ok(MethodSignatureChange {
            target,
            old_name: symbol.name.clone(),
            new_name: symbol.name.clone(),
            old_return_type: details.return_type.clone(),
            new_return_type: details.return_type.clone(),
            old_visibility: symbol.visibility,
            new_visibility: symbol.visibility,
            parameters,
            exceptions,
            delegate: false,
            deprecate_delegate: false,
            state: ValidationState::Unchecked,
        })
    }

    /// Parameters that survive into the new signature, in new order.
    pub fn retained_parameters(&self) -> impl Iterator<Item = &ParameterChange> {
        self.parameters.iter().filter(|p| !p.deleted)
    }

    pub(crate) fn target_details<'a>(
        &self,
        index: &'a Index,
    ) -> Option<&'a recast_index::MethodDetails> {
        index.method_details(self.target.symbol_id())
    }

    pub fn is_renamed(&self) -> bool {
        self.old_name != self.new_name
    }

    /// True when nothing about the signature would change. Such a request is
    /// rejected before any search or edit computation happens.
    pub fn is_noop(&self) -> bool {
        if self.is_renamed()
            || self.old_return_type != self.new_return_type
            || self.old_visibility != self.new_visibility
            || self.delegate
        {
            return false;
        }
        if self
            .exceptions
            .iter()
            .any(|e| !matches!(e, ExceptionChange::Keep { .. }))
        {
            return false;
        }
        let mut expected = 0usize;
        for param in &self.parameters {
            if param.deleted || param.is_added() {
                return false;
            }
            if param.old_index != Some(expected) {
                return false;
            }
            if param.is_renamed() || param.is_retyped() || param.is_old_varargs != param.is_new_varargs
            {
                return false;
            }
            expected += 1;
        }
        true
    }

    /// The new throws list for a declaration currently declaring `old`.
    pub(crate) fn new_throws_for(&self, old: &[String]) -> Vec<String> {
        let mut kept: Vec<String> = old
            .iter()
            .filter(|ty| {
                !self.exceptions.iter().any(|e| {
                    matches!(e, ExceptionChange::Delete { .. }) && same_exception_type(e.ty(), ty)
                })
            })
            .cloned()
            .collect();
        for change in &self.exceptions {
            if let ExceptionChange::Add { ty } = change {
                if !kept.iter().any(|k| same_exception_type(k, ty)) {
                    kept.push(ty.clone());
                }
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_matching_falls_back_to_simple_names() {
        assert!(same_exception_type("java.io.IOException", "IOException"));
        assert!(same_exception_type("IOException", "IOException"));
        assert!(!same_exception_type(
            "java.io.IOException",
            "my.io.IOException"
        ));
        assert!(!same_exception_type("IOException", "SQLException"));
    }

    #[test]
    fn new_throws_applies_delete_then_add() {
        let mut change = MethodSignatureChange {
            target: MethodId(0),
            old_name: "m".into(),
            new_name: "m".into(),
            old_return_type: Some("void".into()),
            new_return_type: Some("void".into()),
            old_visibility: Visibility::Public,
            new_visibility: Visibility::Public,
            parameters: Vec::new(),
            exceptions: vec![
                ExceptionChange::Delete {
                    ty: "IOException".into(),
                },
                ExceptionChange::Add {
                    ty: "java.sql.SQLException".into(),
                },
            ],
            delegate: false,
            deprecate_delegate: false,
            state: ValidationState::Unchecked,
        };
        let old = vec!["java.io.IOException".to_string(), "RuntimeException".into()];
        assert_eq!(
            change.new_throws_for(&old),
            vec![
                "RuntimeException".to_string(),
                "java.sql.SQLException".into()
            ]
        );
        change.exceptions.clear();
        assert_eq!(change.new_throws_for(&old), old);
    }
}
