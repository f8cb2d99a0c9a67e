//! Per-occurrence rewrites. Every occurrence kind goes through the same
//! contract: locate its argument-list handle, reshuffle, and emit edits into
//! the file's rewrite context.

use recast_core::{TextEdit, TextRange};
use recast_index::{
    find_identifier_occurrences, find_matching_paren, Index, MethodDetails, Symbol, SymbolId,
};
use regex::Regex;

use crate::advisor::{value_for_added, AdvisorContext, DefaultValueAdvisor};
use crate::context::{ContextMap, RewriteContext};
use crate::error::{SignatureChangeError, SignatureConflict, SignatureWarning};
use crate::hierarchy::HierarchyCache;
use crate::java;
use crate::javadoc::{rewrite_doc, DocUpdate};
use crate::reshuffle::{list_items, positional_list_edits, reshuffle_args, reshuffle_decl};
use crate::signature::{MethodSignatureChange, ParameterChange};
use crate::visibility::VisibilityAdjustor;

/// Shared read-only state for all updates in one run.
pub(crate) struct UpdateEnv<'a> {
    pub index: &'a Index,
    pub change: &'a MethodSignatureChange,
    pub cache: &'a HierarchyCache,
    pub advisor: Option<&'a dyn DefaultValueAdvisor>,
    pub adjustor: &'a VisibilityAdjustor,
    /// The topmost declaration of the override family; the only one that
    /// receives newly added doc tags.
    pub family_top: SymbolId,
}

impl UpdateEnv<'_> {
    fn is_constructor(&self) -> bool {
        self.change
            .target_details(self.index)
            .map(|d| d.is_constructor)
            .unwrap_or(false)
    }

    fn old_arity(&self) -> (usize, bool) {
        let details = self.change.target_details(self.index);
        let n = details.map(|d| d.params.len()).unwrap_or(0);
        let vararg = details.map(|d| d.is_varargs).unwrap_or(false);
        (n, vararg)
    }
}

/// The closed set of things the engine knows how to rewrite.
#[derive(Debug)]
pub(crate) enum OccurrenceUpdate {
    Declaration {
        symbol: SymbolId,
    },
    CallReference {
        file: String,
        range: TextRange,
        recursive: bool,
    },
    DocReference {
        file: String,
        range: TextRange,
    },
    StaticImportUse {
        file: String,
        range: TextRange,
    },
    MethodReference {
        file: String,
        range: TextRange,
    },
    Lambda {
        file: String,
        params_range: TextRange,
    },
}

impl OccurrenceUpdate {
    pub(crate) fn update_node(
        &self,
        env: &UpdateEnv<'_>,
        contexts: &mut ContextMap,
        warnings: &mut Vec<SignatureWarning>,
    ) -> Result<(), SignatureChangeError> {
        match self {
            OccurrenceUpdate::Declaration { symbol } => {
                update_declaration(env, *symbol, contexts, warnings)
            }
            OccurrenceUpdate::CallReference {
                file,
                range,
                recursive,
            } => update_call(env, file, *range, *recursive, contexts, warnings),
            OccurrenceUpdate::DocReference { file, range } => {
                update_doc_reference(env, file, *range, contexts);
                Ok(())
            }
            OccurrenceUpdate::StaticImportUse { file, range }
            | OccurrenceUpdate::MethodReference { file, range } => {
                if env.change.is_renamed() {
                    let cx = contexts.context(file);
                    cx.push(
                        TextEdit::replace(
                            cx.file().clone(),
                            *range,
                            env.change.new_name.clone(),
                        )
                        .with_group("reference"),
                    );
                }
                Ok(())
            }
            OccurrenceUpdate::Lambda { file, params_range } => {
                update_lambda(env, file, *params_range, contexts);
                Ok(())
            }
        }
    }
}

fn update_declaration(
    env: &UpdateEnv<'_>,
    symbol_id: SymbolId,
    contexts: &mut ContextMap,
    warnings: &mut Vec<SignatureWarning>,
) -> Result<(), SignatureChangeError> {
    let index = env.index;
    let change = env.change;
    let Some(symbol) = index.symbol(symbol_id) else {
        return Ok(());
    };
    let Some(details) = index.method_details(symbol_id) else {
        return Err(SignatureConflict::ParseError {
            file: symbol.file.clone(),
            context: "missing method details",
        }
        .into());
    };
    let Some(text) = index.file_text(&symbol.file) else {
        return Ok(());
    };
    let file_name = symbol.file.clone();
    let cx = contexts.context(&file_name);
    let file = cx.file().clone();

    // Visibility, possibly widened by the adjustor.
    let (effective, widen_warning) = env
        .adjustor
        .resolve(index, symbol, change.new_visibility);
    if let Some(warning) = widen_warning {
        warnings.push(warning);
    }
    if effective != symbol.visibility {
        if let Some(edit) = crate::visibility::modifier_edit(
            &file,
            text,
            details.visibility_range,
            details.modifier_insert_offset,
            effective,
        ) {
            cx.push(edit.with_group("signature"));
        }
    }

    // Name.
    if change.is_renamed() && !details.is_constructor {
        cx.push(
            TextEdit::replace(file.clone(), symbol.name_range, change.new_name.clone())
                .with_group("signature"),
        );
    }

    // Return type, with old-style trailing dims stripped on retype.
    if change.old_return_type != change.new_return_type {
        if let (Some(range), Some(new_ty)) =
            (details.return_type_range, change.new_return_type.as_deref())
        {
            let rendered = java::simple_type_text(new_ty);
            cx.push(TextEdit::replace(file.clone(), range, rendered).with_group("signature"));
            if let Some(old) = &change.old_return_type {
                cx.mark_removed(&java::erase_type(old), range);
            }
            cx.mark_added(new_ty, range);
            if details.extra_dims > 0 {
                let dims = TextRange::new(details.params_range.end + 1, details.throws_insert_offset);
                cx.push(TextEdit::delete(file.clone(), dims).with_group("signature"));
            }
        }
    }

    // Parameter list.
    emit_param_list_edits(env, details, text, cx, &file);

    // Track deleted and surviving parameter types for import pruning.
    for param in &change.parameters {
        let Some(i) = param.old_index else { continue };
        let Some(sketch) = details.params.get(i) else {
            continue;
        };
        if param.deleted {
            cx.mark_removed(&java::erase_type(&sketch.ty), sketch.type_range);
        } else if param.is_retyped() {
            cx.mark_removed(&java::erase_type(&sketch.ty), sketch.type_range);
            cx.mark_added(&param.new_type, sketch.type_range);
        } else {
            cx.mark_retained(&java::erase_type(&sketch.ty), sketch.type_range);
        }
    }
    for param in change.retained_parameters() {
        if param.is_added() {
            cx.mark_added(&param.new_type, details.params_range);
        }
    }

    // Throws clause.
    let new_throws = change.new_throws_for(&details.throws);
    emit_throws_edits(details, &new_throws, cx, &file);

    // Body: parameter renames and deleted-parameter usage.
    if let Some(body) = symbol.body_range {
        rewrite_body(env, symbol, details, body, text, cx, &file, warnings);
    }

    // Doc comment.
    if let Some(doc_range) = symbol.doc_range {
        let doc = &text[doc_range.start..doc_range.end];
        let update = DocUpdate {
            change,
            old_param_names: details.params.iter().map(|p| p.name.clone()).collect(),
            old_throws: &details.throws,
            new_throws: &new_throws,
            add_tags: symbol_id == env.family_top,
            return_type_changed_to_void: change.old_return_type != change.new_return_type
                && change.new_return_type.as_deref() == Some("void"),
            return_type_changed_from_void: change.old_return_type != change.new_return_type
                && change.old_return_type.as_deref() == Some("void"),
        };
        if let Some(rewritten) = rewrite_doc(doc, &update) {
            cx.push(TextEdit::replace(file.clone(), doc_range, rewritten).with_group("javadoc"));
        }
    }

    // Forwarding delegate with the old signature.
    if change.delegate {
        let delegate = delegate_text(env, symbol, details, text);
        cx.push(
            TextEdit::insert(file.clone(), symbol.decl_range.end, delegate)
                .with_group("delegate"),
        );
    }

    Ok(())
}

fn emit_param_list_edits(
    env: &UpdateEnv<'_>,
    details: &MethodDetails,
    text: &str,
    cx: &mut RewriteContext,
    file: &recast_core::FileId,
) {
    let change = env.change;
    let old_items: Vec<String> = details
        .params
        .iter()
        .map(|p| text[p.range.start..p.range.end].to_string())
        .collect();
    let old_ranges: Vec<TextRange> = details.params.iter().map(|p| p.range).collect();

    let new_items = reshuffle_decl(&old_items, &change.parameters, |param, old_text| {
        render_decl_param(details, param, old_text, text)
    });

    if new_items != old_items {
        for edit in positional_list_edits(
            file,
            details.params_range,
            &old_items,
            &old_ranges,
            &new_items,
            "signature",
        ) {
            cx.push(edit);
        }
    }
}

fn render_decl_param(
    details: &MethodDetails,
    param: &ParameterChange,
    old_text: Option<&str>,
    text: &str,
) -> String {
    let sketch = param.old_index.and_then(|i| details.params.get(i));
    match (sketch, old_text) {
        (Some(sketch), Some(old_text)) => {
            let vararg_toggled = param.is_old_varargs != param.is_new_varargs;
            if !param.is_renamed() && !param.is_retyped() && !vararg_toggled {
                return old_text.to_string();
            }
            let name = if param.is_renamed() {
                param.new_name.as_str()
            } else {
                sketch.name.as_str()
            };
            let mut ty = if param.is_retyped() {
                java::simple_type_text(&param.new_type)
            } else {
                text[sketch.type_range.start..sketch.type_range.end].to_string()
            };
            if vararg_toggled {
                if param.is_new_varargs && !ty.ends_with("...") {
                    ty = format!("{}...", ty.trim_end_matches("[]"));
                } else if !param.is_new_varargs && ty.ends_with("...") {
                    ty = format!("{}[]", ty.trim_end_matches("..."));
                }
            }
            format!("{ty} {name}")
        }
        _ => {
            let ty = java::simple_type_text(&param.new_type);
            format!("{ty} {}", param.new_name)
        }
    }
}

fn emit_throws_edits(
    details: &MethodDetails,
    new_throws: &[String],
    cx: &mut RewriteContext,
    file: &recast_core::FileId,
) {
    if *new_throws == details.throws {
        if let Some(range) = details.throws_range {
            for ty in &details.throws {
                cx.mark_retained(&java::erase_type(ty), range);
            }
        }
        return;
    }

    for ty in &details.throws {
        let survives = new_throws.iter().any(|n| n == ty);
        let span = details.throws_range.unwrap_or(details.params_range);
        if survives {
            cx.mark_retained(&java::erase_type(ty), span);
        } else {
            cx.mark_removed(&java::erase_type(ty), span);
        }
    }
    for ty in new_throws {
        if !details.throws.contains(ty) {
            cx.mark_added(ty, details.throws_range.unwrap_or(details.params_range));
        }
    }

    let rendered = new_throws
        .iter()
        .map(|ty| java::simple_type_text(ty))
        .collect::<Vec<_>>()
        .join(", ");

    let edit = match (details.throws_range, new_throws.is_empty()) {
        (Some(range), true) => TextEdit::delete(
            file.clone(),
            TextRange::new(details.throws_insert_offset, range.end),
        ),
        (Some(range), false) => TextEdit::replace(file.clone(), range, format!("throws {rendered}")),
        (None, true) => return,
        (None, false) => TextEdit::insert(
            file.clone(),
            details.throws_insert_offset,
            format!(" throws {rendered}"),
        ),
    };
    cx.push(edit.with_group("signature"));
}

#[allow(clippy::too_many_arguments)]
fn rewrite_body(
    env: &UpdateEnv<'_>,
    symbol: &Symbol,
    details: &MethodDetails,
    body: TextRange,
    text: &str,
    cx: &mut RewriteContext,
    file: &recast_core::FileId,
    warnings: &mut Vec<SignatureWarning>,
) {
    let body_text = &text[body.start..body.end];
    let shadows = shadowed_regions(body_text);

    for param in &env.change.parameters {
        let Some(i) = param.old_index else { continue };
        let Some(sketch) = details.params.get(i) else {
            continue;
        };
        let old_name = sketch.name.as_str();

        if param.deleted {
            let used = find_identifier_occurrences(body_text, old_name)
                .into_iter()
                .any(|occ| !occ.in_doc_comment && !in_shadow(&shadows, occ.range, old_name, body_text));
            if used {
                warnings.push(SignatureWarning::DeletedParameterStillUsed {
                    parameter: old_name.to_string(),
                    method: symbol.name.clone(),
                    file: symbol.file.clone(),
                });
            }
            continue;
        }

        if param.is_renamed() && param.new_name != old_name {
            for occ in find_identifier_occurrences(body_text, old_name) {
                if occ.in_doc_comment || in_shadow(&shadows, occ.range, old_name, body_text) {
                    continue;
                }
                let range = TextRange::new(body.start + occ.range.start, body.start + occ.range.end);
                cx.push(
                    TextEdit::replace(file.clone(), range, param.new_name.clone())
                        .with_group("body"),
                );
            }
        }
    }
}

/// Brace-delimited regions inside a body that belong to a nested anonymous
/// class or local type, where an identically named declaration shadows the
/// parameter.
fn shadowed_regions(body_text: &str) -> Vec<TextRange> {
    let mut out = Vec::new();
    let pattern = match Regex::new(r"\bnew\s+[A-Za-z_$][\w$.]*\s*(?:<[^>]*>)?\s*\(") {
        Ok(p) => p,
        Err(_) => return out,
    };
    for found in pattern.find_iter(body_text) {
        let open_paren = found.end() - 1;
        let Some(after_args) = find_matching_paren(body_text, open_paren) else {
            continue;
        };
        let rest = &body_text[after_args..];
        let ws = rest.len() - rest.trim_start().len();
        if rest[ws..].starts_with('{') {
            let open_brace = after_args + ws;
            if let Some(end) = recast_index::find_matching_brace(body_text, open_brace) {
                out.push(TextRange::new(open_brace, end));
            }
        }
    }
    out
}

fn in_shadow(shadows: &[TextRange], occ: TextRange, name: &str, body_text: &str) -> bool {
    shadows.iter().any(|region| {
        region.contains(occ.start) && region_declares(body_text, *region, name)
    })
}

/// Whether `region` (an anonymous class body) contains its own declaration
/// of `name`: a type-like token directly before it.
fn region_declares(body_text: &str, region: TextRange, name: &str) -> bool {
    let slice = &body_text[region.start..region.end];
    let pattern = format!(
        r"\b(?:int|long|short|byte|double|float|boolean|char|var|final|[A-Z][\w$]*(?:<[^>]*>)?(?:\[\])*)\s+{}\s*[=;,)]",
        regex::escape(name)
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(slice))
        .unwrap_or(false)
}

fn delegate_text(
    env: &UpdateEnv<'_>,
    symbol: &Symbol,
    details: &MethodDetails,
    text: &str,
) -> String {
    let change = env.change;
    let indent = java::line_indent(text, symbol.decl_range.start);
    let prefix = &text[details.modifier_insert_offset..symbol.name_range.start];
    let params = &text[details.params_range.start..details.params_range.end];
    let throws = details
        .throws_range
        .map(|r| format!(" {}", &text[r.start..r.end]))
        .unwrap_or_default();

    let forward_args = reshuffle_args(
        &details
            .params
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<_>>(),
        &change.parameters,
        |added| {
            let args: Vec<String> = details.params.iter().map(|p| p.name.clone()).collect();
            let cx = AdvisorContext {
                call_args: &args,
                parameters: &change.parameters,
                enclosing_method: Some(symbol),
                is_recursive: false,
                file: &symbol.file,
            };
            value_for_added(added, env.advisor, &cx)
        },
    )
    .join(", ");

    let callee = if details.is_constructor {
        "this".to_string()
    } else {
        change.new_name.clone()
    };
    let returns = !details.is_constructor
        && details
            .return_type
            .as_deref()
            .map(|t| t != "void")
            .unwrap_or(false);
    let ret = if returns { "return " } else { "" };

    let deprecated = if change.deprecate_delegate {
        format!("{indent}@Deprecated\n")
    } else {
        String::new()
    };

    format!(
        "\n\n{deprecated}{indent}{prefix}{name}({params}){throws} {{\n{indent}    {ret}{callee}({forward_args});\n{indent}}}",
        name = change.old_name,
    )
}

fn update_call(
    env: &UpdateEnv<'_>,
    file_name: &str,
    range: TextRange,
    recursive: bool,
    contexts: &mut ContextMap,
    warnings: &mut Vec<SignatureWarning>,
) -> Result<(), SignatureChangeError> {
    let index = env.index;
    let change = env.change;
    let Some(text) = index.file_text(file_name) else {
        return Ok(());
    };

    // A same-named declaration on an unrelated type is not a reference.
    if index
        .symbols_in_file(file_name)
        .any(|s| s.name_range == range && !env.cache.contains(s.id))
    {
        return Ok(());
    }

    let is_chained = env.is_constructor()
        && (text[range.start..].starts_with("this(")
            || text[range.start..].starts_with("super(")
            || text[range.start..].starts_with("this ")
            || text[range.start..].starts_with("super "));
    let name_end = if is_chained {
        let keyword_len = if text[range.start..].starts_with("this") {
            4
        } else {
            5
        };
        range.start + keyword_len
    } else {
        range.start + change.old_name.len()
    };

    let bytes = text.as_bytes();
    let mut open = name_end;
    while open < text.len() && bytes[open].is_ascii_whitespace() {
        open += 1;
    }
    if bytes.get(open) != Some(&b'(') {
        warnings.push(SignatureWarning::UnclassifiableOccurrence {
            file: file_name.to_string(),
            range,
        });
        return Ok(());
    }
    let Some(after) = find_matching_paren(text, open) else {
        warnings.push(SignatureWarning::UnclassifiableOccurrence {
            file: file_name.to_string(),
            range,
        });
        return Ok(());
    };
    let list = TextRange::new(open + 1, after - 1);
    let (old_args, old_ranges) = list_items(text, list);

    // Arity check against the old signature; a mismatch is some other
    // overload, reported rather than silently rewritten.
    let (old_n, old_vararg) = env.old_arity();
    let matches_arity = if old_vararg {
        old_args.len() + 1 >= old_n
    } else {
        old_args.len() == old_n
    };
    if !matches_arity {
        warnings.push(SignatureWarning::UnclassifiableOccurrence {
            file: file_name.to_string(),
            range,
        });
        return Ok(());
    }

    let cx = contexts.context(file_name);
    let file = cx.file().clone();

    if change.is_renamed() && !env.is_constructor() && !is_chained {
        cx.push(
            TextEdit::replace(
                file.clone(),
                TextRange::new(range.start, name_end),
                change.new_name.clone(),
            )
            .with_group("reference"),
        );
    }

    let enclosing = index.enclosing_method_at(file_name, range.start);
    let new_args = reshuffle_args(&old_args, &change.parameters, |added| {
        let acx = AdvisorContext {
            call_args: &old_args,
            parameters: &change.parameters,
            enclosing_method: enclosing,
            is_recursive: recursive,
            file: file_name,
        };
        value_for_added(added, env.advisor, &acx)
    });

    if new_args != old_args {
        for edit in
            positional_list_edits(&file, list, &old_args, &old_ranges, &new_args, "call-site")
        {
            cx.push(edit);
        }
    }

    Ok(())
}

/// `{@link Foo#name(int, String)}`: rename the member and keep the type
/// list in step with the new parameter order.
fn update_doc_reference(
    env: &UpdateEnv<'_>,
    file_name: &str,
    range: TextRange,
    contexts: &mut ContextMap,
) {
    let change = env.change;
    let Some(text) = env.index.file_text(file_name) else {
        return;
    };
    let cx = contexts.context(file_name);
    let file = cx.file().clone();

    if change.is_renamed() {
        cx.push(
            TextEdit::replace(file.clone(), range, change.new_name.clone())
                .with_group("javadoc"),
        );
    }

    let bytes = text.as_bytes();
    if bytes.get(range.end) != Some(&b'(') {
        return;
    }
    let Some(after) = find_matching_paren(text, range.end) else {
        return;
    };
    let list = TextRange::new(range.end + 1, after - 1);
    let (old_types, old_ranges) = list_items(text, list);

    let old_param_count = env
        .change
        .target_details(env.index)
        .map(|d| d.params.len())
        .unwrap_or(0);
    if old_types.len() != old_param_count {
        return;
    }

    let new_types = reshuffle_decl(&old_types, &change.parameters, |param, old_text| {
        if param.is_retyped() || param.old_index.is_none() {
            java::simple_type_text(&param.new_type)
        } else {
            old_text.unwrap_or(&param.new_type).to_string()
        }
    });
    if new_types != old_types {
        for edit in
            positional_list_edits(&file, list, &old_types, &old_ranges, &new_types, "javadoc")
        {
            cx.push(edit);
        }
    }
}

/// Reorder a lambda's parameter list alongside the interface method.
fn update_lambda(
    env: &UpdateEnv<'_>,
    file_name: &str,
    params_range: TextRange,
    contexts: &mut ContextMap,
) {
    let change = env.change;
    let Some(text) = env.index.file_text(file_name) else {
        return;
    };
    let cx = contexts.context(file_name);
    let file = cx.file().clone();

    let (old_items, old_ranges) = list_items(text, params_range);
    let typed = old_items.iter().any(|item| item.contains(' '));

    let new_items = reshuffle_decl(&old_items, &change.parameters, |param, old_text| {
        match old_text {
            Some(old_text) if !param.is_renamed() => old_text.to_string(),
            Some(old_text) => match old_text.rsplit_once(' ') {
                Some((ty, _)) => format!("{ty} {}", param.new_name),
                None => param.new_name.clone(),
            },
            None if typed => format!(
                "{} {}",
                java::simple_type_text(&param.new_type),
                param.new_name
            ),
            None => param.new_name.clone(),
        }
    });

    if new_items != old_items {
        for edit in positional_list_edits(
            &file,
            params_range,
            &old_items,
            &old_ranges,
            &new_items,
            "lambda",
        ) {
            cx.push(edit);
        }
    }
}
