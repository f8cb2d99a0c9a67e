//! Precondition checks, run in a fixed order. The first check that produces
//! a fatal conflict stops the run; warnings accumulate across checks.

use recast_index::{eq_ignore_ascii_ws, Index, Symbol};

use crate::error::{SignatureChangeError, SignatureConflict, SignatureWarning};
use crate::hierarchy::HierarchyCache;
use crate::signature::{MethodSignatureChange, ValidationState};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "true",
    "false", "null", "try", "void", "volatile", "while",
];

/// Run every check. On success the change is `FullyResolved` and the
/// accumulated warnings are returned.
pub(crate) fn validate(
    index: &Index,
    change: &mut MethodSignatureChange,
    cache: &HierarchyCache,
) -> Result<Vec<SignatureWarning>, SignatureChangeError> {
    let mut warnings = Vec::new();

    if change.is_noop() {
        return Err(SignatureConflict::NoChange.into());
    }

    let checks: &[fn(
        &Index,
        &MethodSignatureChange,
        &HierarchyCache,
        &mut Vec<SignatureWarning>,
    ) -> Vec<SignatureConflict>] = &[
        check_method_name,
        check_parameter_names,
        check_types_syntactic,
        check_varargs,
        check_type_variable_leak,
        check_signature_clash,
    ];

    for (i, check) in checks.iter().enumerate() {
        let conflicts = check(index, change, cache, &mut warnings);
        if !conflicts.is_empty() {
            tracing::debug!(check = i + 1, count = conflicts.len(), "validation failed");
            return Err(SignatureChangeError { conflicts });
        }
        if i == 2 {
            change.state = ValidationState::SyntaxChecked;
        }
    }

    // The syntactic pass ran as check 3; resolution happened inside the
    // later checks against the index, so the change is now frozen.
    let conflicts = check_types_resolved(index, change, cache, &mut warnings);
    if !conflicts.is_empty() {
        return Err(SignatureChangeError { conflicts });
    }
    change.state = ValidationState::FullyResolved;

    Ok(warnings)
}

pub(crate) fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !JAVA_KEYWORDS.contains(&name)
}

fn check_method_name(
    index: &Index,
    change: &MethodSignatureChange,
    _cache: &HierarchyCache,
    warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();
    let is_constructor = change
        .target_details(index)
        .map(|d| d.is_constructor)
        .unwrap_or(false);

    if is_constructor {
        if change.is_renamed() {
            conflicts.push(SignatureConflict::InvalidMethodName {
                name: change.new_name.clone(),
            });
        }
        return conflicts;
    }

    if !is_java_identifier(&change.new_name) {
        conflicts.push(SignatureConflict::InvalidMethodName {
            name: change.new_name.clone(),
        });
        return conflicts;
    }

    if let Some(symbol) = index.symbol(change.target.symbol_id()) {
        if symbol.container.as_deref() == Some(change.new_name.as_str()) {
            warnings.push(SignatureWarning::MethodNameMatchesType {
                name: change.new_name.clone(),
            });
        }
    }
    conflicts
}

fn check_parameter_names(
    index: &Index,
    change: &MethodSignatureChange,
    cache: &HierarchyCache,
    _warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();
    let old_len = change
        .target_details(index)
        .map(|d| d.params.len())
        .unwrap_or(0);

    for (position, param) in change.parameters.iter().enumerate() {
        if let Some(index) = param.old_index {
            if index >= old_len {
                conflicts.push(SignatureConflict::InvalidParameterIndex {
                    index,
                    param_len: old_len,
                });
            }
        }
        if param.deleted {
            continue;
        }
        if param.new_name.trim().is_empty() {
            conflicts.push(SignatureConflict::EmptyParameterName { position });
        } else if !is_java_identifier(&param.new_name) {
            conflicts.push(SignatureConflict::InvalidParameterName {
                name: param.new_name.clone(),
            });
        }
    }

    let retained: Vec<&str> = change
        .retained_parameters()
        .map(|p| p.new_name.as_str())
        .collect();
    for (i, name) in retained.iter().enumerate() {
        if retained[..i].contains(name) {
            conflicts.push(SignatureConflict::DuplicateParameterName {
                name: name.to_string(),
            });
        }
    }

    // A renamed or added parameter must not collide with a name another
    // declaration in the override family keeps as-is.
    for member in cache.family(index) {
        let Some(details) = index.method_details(member.id) else {
            continue;
        };
        for param in change.retained_parameters() {
            if param.old_index.is_some() && !param.is_renamed() && !param.is_added() {
                continue;
            }
            let collides = details.params.iter().enumerate().any(|(i, existing)| {
                Some(i) != param.old_index
                    && existing.name == param.new_name
                    && change
                        .retained_parameters()
                        .any(|other| other.old_index == Some(i) && !other.is_renamed())
            });
            if collides {
                conflicts.push(SignatureConflict::DuplicateParameterName {
                    name: param.new_name.clone(),
                });
            }
        }
    }
    conflicts.dedup();
    conflicts
}

/// Lexical well-formedness only; resolution happens on the final pass.
fn check_types_syntactic(
    _index: &Index,
    change: &MethodSignatureChange,
    _cache: &HierarchyCache,
    _warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();

    if let Some(ret) = &change.new_return_type {
        if !is_wellformed_type(ret) {
            conflicts.push(SignatureConflict::MalformedType { text: ret.clone() });
        }
    }
    for param in change.retained_parameters() {
        if !is_wellformed_type(&param.new_type) || param.new_type.trim() == "void" {
            conflicts.push(SignatureConflict::MalformedType {
                text: param.new_type.clone(),
            });
        }
        if let Some(value) = &param.default_value {
            if !value.trim().is_empty() && !is_balanced_expression(value) {
                conflicts.push(SignatureConflict::MalformedDefaultValue {
                    parameter: param.new_name.clone(),
                    text: value.clone(),
                });
            }
        }
    }
    for exception in &change.exceptions {
        if !is_wellformed_type(exception.ty()) {
            conflicts.push(SignatureConflict::MalformedType {
                text: exception.ty().to_string(),
            });
        }
    }
    conflicts
}

fn check_varargs(
    index: &Index,
    change: &MethodSignatureChange,
    cache: &HierarchyCache,
    warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();
    let retained: Vec<_> = change.retained_parameters().collect();

    let vararg_count = retained.iter().filter(|p| p.is_new_varargs).count();
    if vararg_count > 1 {
        conflicts.push(SignatureConflict::MultipleVarargs);
    }
    for (i, param) in retained.iter().enumerate() {
        if param.is_new_varargs && i + 1 != retained.len() {
            conflicts.push(SignatureConflict::VarargNotLast {
                name: param.new_name.clone(),
            });
        }
    }

    // Downgrading a vararg is only sound when no other declaration in the
    // family keeps declaring it vararg.
    if cache.family_len() > 1 {
        for param in &retained {
            if !param.is_old_varargs || param.is_new_varargs {
                continue;
            }
            for member in cache.family(index) {
                if member.id == change.target.symbol_id() {
                    continue;
                }
                let still_vararg = param
                    .old_index
                    .and_then(|i| {
                        index
                            .method_details(member.id)
                            .and_then(|d| d.params.get(i))
                    })
                    .map(|p| p.is_varargs)
                    .unwrap_or(false);
                if still_vararg {
                    conflicts.push(SignatureConflict::VarargDowngradeBlocked {
                        name: param.new_name.clone(),
                        method: member.name.clone(),
                        file: member.file.clone(),
                    });
                }
            }
        }
    }

    // Reordering the parameters of a native method breaks its JNI side.
    if parameters_reordered(change) {
        for member in cache.family(index) {
            let native = index
                .method_details(member.id)
                .map(|d| d.is_native)
                .unwrap_or(false);
            if native {
                warnings.push(SignatureWarning::NativeMethodReorder {
                    method: member.name.clone(),
                    file: member.file.clone(),
                });
            }
        }
    }

    conflicts
}

fn parameters_reordered(change: &MethodSignatureChange) -> bool {
    let mut last = None;
    for param in change.retained_parameters() {
        match (param.old_index, last) {
            (Some(i), Some(prev)) if i < prev => return true,
            (Some(i), _) => last = Some(i),
            (None, _) => return true,
        }
    }
    change.parameters.iter().any(|p| p.deleted)
}

fn check_type_variable_leak(
    index: &Index,
    change: &MethodSignatureChange,
    cache: &HierarchyCache,
    warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    if cache.family_len() <= 1 {
        return Vec::new();
    }
    let type_params: Vec<String> = change
        .target_details(index)
        .map(|d| d.type_params.clone())
        .unwrap_or_default();

    let mut changed_types: Vec<&str> = Vec::new();
    if change.old_return_type != change.new_return_type {
        if let Some(ret) = &change.new_return_type {
            changed_types.push(ret);
        }
    }
    for param in change.retained_parameters() {
        if param.is_retyped() || param.is_added() {
            changed_types.push(&param.new_type);
        }
    }

    for ty in changed_types {
        let simple = ty.trim().trim_end_matches("...");
        let looks_like_variable = type_params.iter().any(|v| v == simple)
            || (simple.len() == 1 && simple.chars().all(|c| c.is_ascii_uppercase()));
        if looks_like_variable {
            warnings.push(SignatureWarning::TypeVariableLeak {
                variable: simple.to_string(),
                method: change.new_name.clone(),
            });
        }
    }
    Vec::new()
}

fn check_signature_clash(
    index: &Index,
    change: &MethodSignatureChange,
    cache: &HierarchyCache,
    _warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();
    let new_types: Vec<String> = change
        .retained_parameters()
        .map(|p| p.new_type.clone())
        .collect();

    for member in cache.family(index) {
        let Some(type_name) = member.container.as_deref() else {
            continue;
        };
        for sibling in index.methods_of(type_name, &change.new_name) {
            if cache.contains(sibling.id) {
                continue;
            }
            if sibling.param_types.len() != new_types.len() {
                continue;
            }
            // Only exact type-sequence matches are detected; erasure-level
            // collisions are left to the compiler.
            let same = sibling
                .param_types
                .iter()
                .zip(&new_types)
                .all(|(a, b)| eq_ignore_ascii_ws(a, b));
            if same {
                conflicts.push(SignatureConflict::SignatureClash {
                    type_name: type_name.to_string(),
                    method: change.new_name.clone(),
                });
            }
        }
    }
    conflicts.dedup();
    conflicts
}

/// Final pass: every new type's simple name must denote something the index
/// or the platform plausibly knows.
fn check_types_resolved(
    index: &Index,
    change: &MethodSignatureChange,
    _cache: &HierarchyCache,
    _warnings: &mut Vec<SignatureWarning>,
) -> Vec<SignatureConflict> {
    let mut conflicts = Vec::new();
    let mut check = |ty: &str| {
        if !type_resolves(index, ty) {
            conflicts.push(SignatureConflict::UnresolvedType {
                text: ty.to_string(),
            });
        }
    };
    if change.old_return_type != change.new_return_type {
        if let Some(ret) = &change.new_return_type {
            check(ret);
        }
    }
    for param in change.retained_parameters() {
        if param.is_retyped() || param.is_added() {
            check(&param.new_type);
        }
    }
    for exception in &change.exceptions {
        if let crate::signature::ExceptionChange::Add { ty } = exception {
            check(ty);
        }
    }
    conflicts
}

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

const COMMON_JAVA_TYPES: &[&str] = &[
    "Object",
    "String",
    "CharSequence",
    "StringBuilder",
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Character",
    "Boolean",
    "Float",
    "Double",
    "Number",
    "Void",
    "Class",
    "Iterable",
    "Runnable",
    "Thread",
    "Exception",
    "RuntimeException",
    "Error",
    "Throwable",
    "IllegalArgumentException",
    "IllegalStateException",
    "UnsupportedOperationException",
    "NullPointerException",
    "Comparable",
    "Cloneable",
    "Deprecated",
    "Override",
    "SafeVarargs",
];

fn type_resolves(index: &Index, ty: &str) -> bool {
    let base = crate::java::erase_type(ty);
    if base.is_empty() {
        return false;
    }
    if ty.contains('.') {
        // Qualified names are taken at face value.
        return true;
    }
    if PRIMITIVES.contains(&base.as_str()) || COMMON_JAVA_TYPES.contains(&base.as_str()) {
        return true;
    }
    if index.type_symbol(&base).is_some() {
        return true;
    }
    // A single uppercase letter reads as a type variable.
    if base.len() == 1 && base.chars().all(|c| c.is_ascii_uppercase()) {
        return true;
    }
    index
        .files()
        .any(|(file, _)| index.imports_of(file).iter().any(|i| i.simple_name == base))
}

fn is_wellformed_type(ty: &str) -> bool {
    let ty = ty.trim();
    if ty.is_empty() {
        return false;
    }
    let mut chars = ty.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    let mut angle = 0i32;
    let mut bracket = 0i32;
    for c in ty.chars() {
        match c {
            '<' => angle += 1,
            '>' => angle -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            c if c.is_alphanumeric() => {}
            '_' | '$' | '.' | ',' | '?' | '&' | ' ' => {}
            _ => return false,
        }
        if angle < 0 || bracket < 0 {
            return false;
        }
    }
    angle == 0 && bracket == 0
}

/// Shallow expression check for default values: balanced delimiters and
/// terminated string/char literals.
fn is_balanced_expression(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth_paren = 0i32;
    let mut depth_brack = 0i32;
    let mut depth_brace = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                let mut closed = false;
                while i < bytes.len() {
                    if bytes[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if bytes[i] == quote {
                        closed = true;
                        break;
                    }
                    i += 1;
                }
                if !closed {
                    return false;
                }
            }
            b'(' => depth_paren += 1,
            b')' => depth_paren -= 1,
            b'[' => depth_brack += 1,
            b']' => depth_brack -= 1,
            b'{' => depth_brace += 1,
            b'}' => depth_brace -= 1,
            b';' => return false,
            _ => {}
        }
        if depth_paren < 0 || depth_brack < 0 || depth_brace < 0 {
            return false;
        }
        i += 1;
    }
    depth_paren == 0 && depth_brack == 0 && depth_brace == 0
}
