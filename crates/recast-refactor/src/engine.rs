//! The full signature-change pipeline: resolve, validate, search, rewrite,
//! finalize. The returned [`recast_core::WorkspaceEdit`] is the only commit
//! point; a failed or cancelled run yields no edits at all.

use recast_core::{CancellationToken, WorkspaceEdit};
use recast_index::{Index, Symbol, SymbolId};
use tracing::debug;

use crate::advisor::DefaultValueAdvisor;
use crate::constructors;
use crate::context::ContextMap;
use crate::descriptor::SignatureChangeDescriptor;
use crate::error::{SignatureChangeError, SignatureConflict, SignatureWarning};
use crate::hierarchy::HierarchyCache;
use crate::occurrence::{locate_occurrences, Occurrence, OccurrenceKind};
use crate::postcheck;
use crate::signature::MethodSignatureChange;
use crate::update::{OccurrenceUpdate, UpdateEnv};
use crate::validate::validate;
use crate::visibility::{self, required_visibility, VisibilityAdjustor};

pub struct ChangeSignatureOptions<'a> {
    pub advisor: Option<&'a dyn DefaultValueAdvisor>,
    pub cancel: CancellationToken,
    /// Run the post-edit sanity check and attach its findings as warnings.
    pub post_check: bool,
    /// Proceed past occurrences the classifier could not map to a known
    /// shape, reporting them as warnings instead of aborting.
    pub proceed_past_unclassified: bool,
}

impl Default for ChangeSignatureOptions<'_> {
    fn default() -> Self {
        ChangeSignatureOptions {
            advisor: None,
            cancel: CancellationToken::new(),
            post_check: true,
            proceed_past_unclassified: false,
        }
    }
}

#[derive(Debug)]
pub struct SignatureChangeOutcome {
    pub edit: WorkspaceEdit,
    pub warnings: Vec<SignatureWarning>,
    pub descriptor: SignatureChangeDescriptor,
}

pub fn change_signature(
    index: &Index,
    mut change: MethodSignatureChange,
    options: &ChangeSignatureOptions<'_>,
) -> Result<SignatureChangeOutcome, SignatureChangeError> {
    let cancel = &options.cancel;
    cancel.checkpoint()?;

    let target_id = change.target.symbol_id();
    let target = index
        .symbol(target_id)
        .ok_or(SignatureConflict::MissingTarget(change.target))?;
    if index.method_details(target_id).is_none() {
        return Err(SignatureConflict::TargetNotAMethod(change.target).into());
    }

    let cache = HierarchyCache::new(index, target);
    debug!(
        method = %change.old_name,
        family = cache.family_len(),
        "resolved override family"
    );

    let mut warnings = validate(index, &mut change, &cache)?;
    debug!(method = %change.old_name, "preconditions hold");

    let occurrences = locate_occurrences(index, &cache, &change, cancel)?;
    debug!(occurrences = occurrences.len(), "search complete");

    let unclassified: Vec<&Occurrence> = occurrences
        .iter()
        .filter(|o| o.kind == OccurrenceKind::Unclassifiable)
        .collect();
    if !unclassified.is_empty() {
        if options.proceed_past_unclassified {
            warnings.extend(unclassified.iter().map(|o| {
                SignatureWarning::UnclassifiableOccurrence {
                    file: o.file.clone(),
                    range: o.range,
                }
            }));
        } else {
            return Err(SignatureChangeError {
                conflicts: unclassified
                    .iter()
                    .map(|o| SignatureConflict::UnclassifiableOccurrence {
                        file: o.file.clone(),
                        range: o.range,
                    })
                    .collect(),
            });
        }
    }

    let mut adjustor = VisibilityAdjustor::default();
    record_visibility_requirements(index, &cache, &change, &occurrences, &mut adjustor);

    let family_top = family_top(index, &cache, target_id);
    let env = UpdateEnv {
        index,
        change: &change,
        cache: &cache,
        advisor: options.advisor,
        adjustor: &adjustor,
        family_top,
    };

    let mut contexts = ContextMap::default();
    for occurrence in &occurrences {
        cancel.checkpoint()?;
        let Some(update) = plan_update(index, &cache, occurrence) else {
            continue;
        };
        update.update_node(&env, &mut contexts, &mut warnings)?;
    }

    if constructors::requires_propagation(index, &change) {
        constructors::propagate_to_subclasses(&env, &mut contexts);
    }

    widen_outgoing_references(index, &cache, &mut contexts, &mut warnings);

    let edit = contexts.finalize(index, cancel)?;
    debug!(edits = edit.edits.len(), "edits finalized");

    if options.post_check {
        warnings.extend(postcheck::verify(index, &change, target, &edit));
    }

    let descriptor = SignatureChangeDescriptor::from_change(index, &change);
    Ok(SignatureChangeOutcome {
        edit,
        warnings,
        descriptor,
    })
}

/// Replay a previously recorded change against the current index.
pub fn replay(
    index: &Index,
    descriptor: &SignatureChangeDescriptor,
    options: &ChangeSignatureOptions<'_>,
) -> Result<SignatureChangeOutcome, SignatureChangeError> {
    let change = descriptor.to_change(index)?;
    change_signature(index, change, options)
}

fn plan_update(
    index: &Index,
    cache: &HierarchyCache,
    occurrence: &Occurrence,
) -> Option<OccurrenceUpdate> {
    match occurrence.kind {
        OccurrenceKind::Declaration => occurrence
            .declaration
            .map(|symbol| OccurrenceUpdate::Declaration { symbol }),
        OccurrenceKind::CallLikeReference => Some(OccurrenceUpdate::CallReference {
            file: occurrence.file.clone(),
            range: occurrence.range,
            recursive: is_recursive_site(index, cache, occurrence),
        }),
        OccurrenceKind::DocReference => {
            // Doc references inside a family member's own comment are
            // rewritten wholesale with that comment.
            if inside_family_doc(index, cache, occurrence) {
                return None;
            }
            Some(OccurrenceUpdate::DocReference {
                file: occurrence.file.clone(),
                range: occurrence.range,
            })
        }
        OccurrenceKind::StaticImportUse => Some(OccurrenceUpdate::StaticImportUse {
            file: occurrence.file.clone(),
            range: occurrence.range,
        }),
        OccurrenceKind::MethodReferenceExpr => Some(OccurrenceUpdate::MethodReference {
            file: occurrence.file.clone(),
            range: occurrence.range,
        }),
        OccurrenceKind::LambdaDeclaration => Some(OccurrenceUpdate::Lambda {
            file: occurrence.file.clone(),
            params_range: occurrence.range,
        }),
        // Already surfaced as a conflict or an opted-into warning.
        OccurrenceKind::Unclassifiable => None,
    }
}

fn is_recursive_site(index: &Index, cache: &HierarchyCache, occurrence: &Occurrence) -> bool {
    cache.family(index).iter().any(|member| {
        member.file == occurrence.file
            && member
                .body_range
                .is_some_and(|body| body.contains(occurrence.range.start))
    })
}

fn inside_family_doc(index: &Index, cache: &HierarchyCache, occurrence: &Occurrence) -> bool {
    cache.family(index).iter().any(|member| {
        member.file == occurrence.file
            && member
                .doc_range
                .is_some_and(|doc| doc.contains(occurrence.range.start))
    })
}

/// The incoming direction: required visibility is judged per family member
/// against every reference site, existing and about-to-be-inserted, and the
/// adjustor keeps the maximum. Recorded whenever the request touches
/// visibility at all; the adjustor only ever widens, so a widening request
/// simply has nothing to collect against.
fn record_visibility_requirements(
    index: &Index,
    cache: &HierarchyCache,
    change: &MethodSignatureChange,
    occurrences: &[Occurrence],
    adjustor: &mut VisibilityAdjustor,
) {
    if change.new_visibility == change.old_visibility {
        return;
    }
    let family: Vec<&Symbol> = cache.family(index);
    for occurrence in occurrences {
        if occurrence.kind == OccurrenceKind::Declaration {
            continue;
        }
        for member in &family {
            let required = required_visibility(
                index,
                cache,
                member,
                &occurrence.file,
                occurrence.range.start,
            );
            adjustor.require(member.id, required);
        }
    }

    // Constructor propagation inserts chained calls into every direct
    // subclass; those sites vote like any other reference.
    if constructors::requires_propagation(index, change) {
        for sub in index.direct_subtypes(cache.target_type()) {
            let Some(type_symbol) = index.type_symbol(sub) else {
                continue;
            };
            let offset = type_symbol
                .body_range
                .map(|b| b.start)
                .unwrap_or(type_symbol.decl_range.start);
            for member in &family {
                let required =
                    required_visibility(index, cache, member, &type_symbol.file, offset);
                adjustor.require(member.id, required);
            }
        }
    }
}

/// The outgoing direction: members of other types called from inserted text
/// are widened in place when the new reference site cannot reach them.
fn widen_outgoing_references(
    index: &Index,
    cache: &HierarchyCache,
    contexts: &mut ContextMap,
    warnings: &mut Vec<SignatureWarning>,
) {
    for (member_id, level) in visibility::outgoing_requirements(index, cache, contexts) {
        let Some(member) = index.symbol(member_id) else {
            continue;
        };
        if member.visibility >= level {
            continue;
        }
        let Some(details) = index.method_details(member_id) else {
            continue;
        };
        let Some(text) = index.file_text(&member.file) else {
            continue;
        };
        let cx = contexts.context(&member.file);
        let file = cx.file().clone();
        if let Some(edit) = visibility::modifier_edit(
            &file,
            text,
            details.visibility_range,
            details.modifier_insert_offset,
            level,
        ) {
            cx.push(edit.with_group("visibility"));
            warnings.push(SignatureWarning::VisibilityAdjusted {
                member: member.name.clone(),
                file: member.file.clone(),
                level,
            });
        }
    }
}

/// The member of the override family highest in the type hierarchy; ties
/// fall back to the requested target.
fn family_top(index: &Index, cache: &HierarchyCache, target: SymbolId) -> SymbolId {
    let family = cache.family(index);
    family
        .iter()
        .find(|member| {
            let Some(container) = member.container.as_deref() else {
                return false;
            };
            let supers = index.all_supertypes(container);
            family.iter().all(|other| {
                other.id == member.id
                    || other
                        .container
                        .as_deref()
                        .map(|c| !supers.contains(&c.to_string()))
                        .unwrap_or(true)
            })
        })
        .map(|member| member.id)
        .unwrap_or(target)
}
