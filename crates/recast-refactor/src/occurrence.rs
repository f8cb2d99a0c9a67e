//! Turning raw index candidates into classified occurrences.

use recast_core::{CancellationToken, Cancelled, TextRange};
use recast_index::{
    find_matching_paren, Index, ReferenceKind, Symbol, SymbolId, SymbolKind, TypeKind,
};
use regex::Regex;

use crate::hierarchy::HierarchyCache;
use crate::signature::MethodSignatureChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceKind {
    Declaration,
    CallLikeReference,
    DocReference,
    StaticImportUse,
    LambdaDeclaration,
    MethodReferenceExpr,
    Unclassifiable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub file: String,
    /// For call-like occurrences this covers the callee name; the argument
    /// list is located from here at update time.
    pub range: TextRange,
    pub kind: OccurrenceKind,
    /// Set for `Declaration` occurrences.
    pub declaration: Option<SymbolId>,
}

pub(crate) fn locate_occurrences(
    index: &Index,
    cache: &HierarchyCache,
    change: &MethodSignatureChange,
    cancel: &CancellationToken,
) -> Result<Vec<Occurrence>, Cancelled> {
    let mut out = Vec::new();
    let family = cache.family(index);
    let is_constructor = change
        .target_details(index)
        .map(|d| d.is_constructor)
        .unwrap_or(false);

    for member in &family {
        out.push(Occurrence {
            file: member.file.clone(),
            range: member.name_range,
            kind: OccurrenceKind::Declaration,
            declaration: Some(member.id),
        });
    }

    for candidate in index.find_name_candidates(&change.old_name) {
        cancel.checkpoint()?;
        if let Some(decl) = declaration_for(&family, &candidate.file, candidate.range) {
            // Search ranges covering a constructor declaration name one byte
            // long of the name resolve to the chained call when the body
            // opens with one.
            if is_constructor && candidate.range.len() == change.old_name.len() + 1 {
                if let Some(call) = chained_call(index, decl) {
                    out.push(call);
                }
            }
            continue;
        }

        let kind = match candidate.kind {
            ReferenceKind::Call => {
                if is_constructor && !preceded_by_new(index, &candidate.file, candidate.range) {
                    // A type name followed by `(` that isn't an allocation:
                    // a cast or a generic bound. Not a constructor reference.
                    continue;
                }
                OccurrenceKind::CallLikeReference
            }
            ReferenceKind::DocReference => OccurrenceKind::DocReference,
            ReferenceKind::StaticImport => OccurrenceKind::StaticImportUse,
            ReferenceKind::MethodRef => OccurrenceKind::MethodReferenceExpr,
            ReferenceKind::TypeUsage if is_constructor => continue,
            ReferenceKind::FieldAccess if is_constructor => continue,
            ReferenceKind::TypeUsage | ReferenceKind::FieldAccess | ReferenceKind::Unknown => {
                if is_constructor {
                    continue;
                }
                OccurrenceKind::Unclassifiable
            }
        };
        out.push(Occurrence {
            file: candidate.file,
            range: candidate.range,
            kind,
            declaration: None,
        });
    }

    if is_constructor {
        collect_chained_calls(index, cache, &mut out, cancel)?;
    } else {
        collect_lambdas(index, cache, change, &mut out, cancel)?;
    }

    out.sort_by(|a, b| a.file.cmp(&b.file).then(a.range.start.cmp(&b.range.start)));
    out.dedup_by(|a, b| a.file == b.file && a.range == b.range);
    Ok(out)
}

fn declaration_for<'a>(
    family: &[&'a Symbol],
    file: &str,
    range: TextRange,
) -> Option<&'a Symbol> {
    family.iter().copied().find(|member| {
        member.file == file
            && member.name_range.start == range.start
            && (member.name_range.end == range.end || member.name_range.end + 1 == range.end)
    })
}

fn preceded_by_new(index: &Index, file: &str, range: TextRange) -> bool {
    let Some(text) = index.file_text(file) else {
        return false;
    };
    let head = text[..range.start].trim_end();
    head.ends_with("new")
        && head[..head.len() - 3]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true)
}

/// The `this(...)`/`super(...)` call opening a constructor body, if any.
pub(crate) fn chained_call(index: &Index, ctor: &Symbol) -> Option<Occurrence> {
    let text = index.file_text(&ctor.file)?;
    let body = ctor.body_range?;
    let (keyword_start, keyword) = first_word(text, body)?;
    if keyword != "this" && keyword != "super" {
        return None;
    }
    let mut i = keyword_start + keyword.len();
    let bytes = text.as_bytes();
    while i < body.end && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    let after = find_matching_paren(text, i)?;
    Some(Occurrence {
        file: ctor.file.clone(),
        range: TextRange::new(keyword_start, after),
        kind: OccurrenceKind::CallLikeReference,
        declaration: None,
    })
}

fn first_word(text: &str, body: TextRange) -> Option<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut i = body.start;
    loop {
        while i < body.end && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i + 1 < body.end && bytes[i] == b'/' && bytes[i + 1] == b'/' {
            while i < body.end && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if i + 1 < body.end && bytes[i] == b'/' && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < body.end && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(body.end);
            continue;
        }
        break;
    }
    let start = i;
    while i < body.end && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i == start {
        None
    } else {
        Some((start, &text[start..i]))
    }
}

/// Chained constructor calls targeting the changed constructor: `this(...)`
/// in sibling constructors and `super(...)` in subtype constructors.
fn collect_chained_calls(
    index: &Index,
    cache: &HierarchyCache,
    out: &mut Vec<Occurrence>,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    let target_type = cache.target_type();
    let mut ctor_homes: Vec<String> = vec![target_type.to_string()];
    ctor_homes.extend(index.direct_subtypes(target_type).iter().cloned());

    for type_name in ctor_homes {
        cancel.checkpoint()?;
        let wants_super = type_name != target_type;
        for ctor in index.constructors_of(&type_name) {
            let Some(call) = chained_call(index, ctor) else {
                continue;
            };
            let Some(text) = index.file_text(&ctor.file) else {
                continue;
            };
            let is_super = text[call.range.start..].starts_with("super");
            if is_super == wants_super {
                out.push(call);
            }
        }
    }
    Ok(())
}

/// Lambdas implementing a functional interface whose single abstract method
/// is being changed. Located lexically: a variable of the interface type
/// initialized with a parenthesized lambda.
fn collect_lambdas(
    index: &Index,
    cache: &HierarchyCache,
    change: &MethodSignatureChange,
    out: &mut Vec<Occurrence>,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    let target_type = cache.target_type();
    if index.type_kind(target_type) != Some(TypeKind::Interface) {
        return Ok(());
    }
    let single_abstract = index
        .all_methods_of(target_type)
        .into_iter()
        .filter(|m| m.body_range.is_none() && m.kind == SymbolKind::Method)
        .collect::<Vec<_>>();
    if single_abstract.len() != 1 || single_abstract[0].name != change.old_name {
        return Ok(());
    }

    let pattern = match Regex::new(&format!(
        r"\b{}\s+\w+\s*=\s*\(",
        regex::escape(target_type)
    )) {
        Ok(p) => p,
        Err(_) => return Ok(()),
    };

    for (file, text) in index.files() {
        cancel.checkpoint()?;
        for found in pattern.find_iter(text) {
            let open = found.end() - 1;
            let Some(after) = find_matching_paren(text, open) else {
                continue;
            };
            if text[after..].trim_start().starts_with("->") {
                out.push(Occurrence {
                    file: file.to_string(),
                    range: TextRange::new(open + 1, after - 1),
                    kind: OccurrenceKind::LambdaDeclaration,
                    declaration: None,
                });
            }
        }
    }
    Ok(())
}
