//! Deferred visibility adjustments: reference sites vote on the access
//! level a member needs, and the declaration is widened (never narrowed) in
//! a second pass.

use std::collections::BTreeMap;

use recast_core::{FileId, TextEdit, TextRange};
use recast_index::{find_identifier_occurrences, Index, Symbol, SymbolId, SymbolKind, TypeKind, Visibility};

use crate::context::ContextMap;
use crate::error::SignatureWarning;
use crate::hierarchy::HierarchyCache;

/// Collects `(member, required level)` records during the reference phase.
#[derive(Debug, Default)]
pub(crate) struct VisibilityAdjustor {
    required: BTreeMap<SymbolId, Visibility>,
}

impl VisibilityAdjustor {
    /// Record that `member` must be at least `level` visible. Repeated calls
    /// keep the maximum.
    pub(crate) fn require(&mut self, member: SymbolId, level: Visibility) {
        let entry = self.required.entry(member).or_insert(level);
        if level > *entry {
            *entry = level;
        }
    }

    /// The final level for `member`: the requested one, widened to the
    /// maximum any reference requires. Returns the warning to attach when
    /// widening actually happened.
    pub(crate) fn resolve(
        &self,
        index: &Index,
        member: &Symbol,
        requested: Visibility,
    ) -> (Visibility, Option<SignatureWarning>) {
        if exempt(index, member) {
            return (requested, None);
        }
        let Some(required) = self.required.get(&member.id) else {
            return (requested, None);
        };
        if *required > requested {
            let warning = SignatureWarning::VisibilityAdjusted {
                member: member.name.clone(),
                file: member.file.clone(),
                level: *required,
            };
            (*required, Some(warning))
        } else {
            (requested, None)
        }
    }
}

/// The keyword surgery for setting a declaration's access level: replace
/// the existing keyword, delete it and its trailing space for
/// package-private, or insert a fresh one at `insert_offset`.
pub(crate) fn modifier_edit(
    file: &FileId,
    text: &str,
    visibility_range: Option<TextRange>,
    insert_offset: usize,
    new: Visibility,
) -> Option<TextEdit> {
    match (visibility_range, new.keyword()) {
        (Some(range), Some(keyword)) => Some(TextEdit::replace(file.clone(), range, keyword)),
        (Some(range), None) => {
            let bytes = text.as_bytes();
            let mut end = range.end;
            while bytes.get(end) == Some(&b' ') {
                end += 1;
            }
            Some(TextEdit::delete(file.clone(), TextRange::new(range.start, end)))
        }
        (None, Some(keyword)) => Some(TextEdit::insert(
            file.clone(),
            insert_offset,
            format!("{keyword} "),
        )),
        (None, None) => None,
    }
}

/// Interface and annotation members are implicitly public; enum constants
/// carry no access modifier at all.
fn exempt(index: &Index, member: &Symbol) -> bool {
    if member.kind == SymbolKind::EnumConstant {
        return true;
    }
    member
        .container
        .as_deref()
        .and_then(|t| index.type_kind(t))
        .map(|k| matches!(k, TypeKind::Interface | TypeKind::Annotation))
        .unwrap_or(false)
}

/// The narrowest level letting a reference at `(file, offset)` reach a
/// member declared in `decl`: same declaring type gets `Private`, a sub- or
/// supertype gets `Protected`, the same compilation unit or package gets
/// package-private, anything else `Public`.
pub(crate) fn required_visibility(
    index: &Index,
    cache: &HierarchyCache,
    decl: &Symbol,
    ref_file: &str,
    ref_offset: usize,
) -> Visibility {
    let decl_type = decl.container.as_deref().unwrap_or_default();

    if let Some(enclosing) = index.enclosing_type_at(ref_file, ref_offset) {
        if enclosing.name == decl_type || cache.declares(&enclosing.name) {
            return Visibility::Private;
        }
        if cache.is_related(&enclosing.name) {
            return Visibility::Protected;
        }
    }

    if ref_file == decl.file {
        return Visibility::PackagePrivate;
    }
    match (index.package_of(ref_file), index.package_of(&decl.file)) {
        (Some(a), Some(b)) if a == b => Visibility::PackagePrivate,
        (None, None) => Visibility::PackagePrivate,
        _ => Visibility::Public,
    }
}

/// The distance rule for members outside the change family: the sub- and
/// supertype checks run against the index directly.
pub(crate) fn reference_distance(
    index: &Index,
    decl: &Symbol,
    ref_file: &str,
    ref_offset: usize,
) -> Visibility {
    let decl_type = decl.container.as_deref().unwrap_or_default();

    if let Some(enclosing) = index.enclosing_type_at(ref_file, ref_offset) {
        if enclosing.name == decl_type {
            return Visibility::Private;
        }
        if index
            .all_supertypes(&enclosing.name)
            .iter()
            .any(|t| t == decl_type)
        {
            return Visibility::Protected;
        }
    }

    if ref_file == decl.file {
        return Visibility::PackagePrivate;
    }
    match (index.package_of(ref_file), index.package_of(&decl.file)) {
        (Some(a), Some(b)) if a == b => Visibility::PackagePrivate,
        (None, None) => Visibility::PackagePrivate,
        _ => Visibility::Public,
    }
}

/// The outgoing direction: text this rewrite inserts can call members of
/// other types, and each such member must stay reachable from its new
/// reference site. Returns the `(member, required level)` records the
/// planned insertions imply; family members are excluded, their votes flow
/// through the adjustor instead.
pub(crate) fn outgoing_requirements(
    index: &Index,
    cache: &HierarchyCache,
    contexts: &ContextMap,
) -> Vec<(SymbolId, Visibility)> {
    let mut required: BTreeMap<SymbolId, Visibility> = BTreeMap::new();
    for (file, edits) in contexts.planned() {
        for edit in edits {
            if edit.replacement.is_empty() {
                continue;
            }
            for member in index.symbols() {
                if member.kind != SymbolKind::Method
                    || cache.contains(member.id)
                    || exempt(index, member)
                {
                    continue;
                }
                for occ in find_identifier_occurrences(&edit.replacement, &member.name) {
                    if occ.in_doc_comment {
                        continue;
                    }
                    let rest = edit.replacement[occ.range.end..].trim_start();
                    if !rest.starts_with('(') {
                        continue;
                    }
                    let level = reference_distance(index, member, file, edit.range.start);
                    let entry = required.entry(member.id).or_insert(level);
                    if level > *entry {
                        *entry = level;
                    }
                }
            }
        }
    }
    required.into_iter().collect()
}
