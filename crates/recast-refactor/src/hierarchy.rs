//! Precomputed hierarchy facts for one signature change.

use std::collections::BTreeSet;

use recast_index::{Index, Symbol, SymbolId};

/// The override family and type-relationship sets for the target, computed
/// once up front and passed by reference into every later phase.
#[derive(Debug)]
pub struct HierarchyCache {
    /// The target plus every declaration in its override ripple, declarations
    /// first in deterministic (file, offset) order.
    family: Vec<SymbolId>,
    declaring_types: BTreeSet<String>,
    /// Types related to the target's declaring type by sub/supertyping.
    related_types: BTreeSet<String>,
    target_type: String,
}

impl HierarchyCache {
    pub fn new(index: &Index, target: &Symbol) -> Self {
        let target_type = target.container.clone().unwrap_or_default();

        let details = index.method_details(target.id);
        let ripples = details.map(|d| !d.is_constructor && !d.is_static).unwrap_or(false)
            && target.visibility != recast_index::Visibility::Private;

        let mut family: Vec<&Symbol> = if ripples {
            index.override_group(target)
        } else {
            vec![target]
        };
        family.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.decl_range.start.cmp(&b.decl_range.start))
        });
        family.dedup_by_key(|s| s.id);

        let declaring_types: BTreeSet<String> = family
            .iter()
            .filter_map(|s| s.container.clone())
            .collect();

        let mut related_types = BTreeSet::new();
        related_types.extend(index.all_subtypes(&target_type));
        related_types.extend(index.all_supertypes(&target_type));

        HierarchyCache {
            family: family.into_iter().map(|s| s.id).collect(),
            declaring_types,
            related_types,
            target_type,
        }
    }

    pub fn family<'a>(&self, index: &'a Index) -> Vec<&'a Symbol> {
        self.family
            .iter()
            .filter_map(|id| index.symbol(*id))
            .collect()
    }

    pub fn family_len(&self) -> usize {
        self.family.len()
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.family.contains(&id)
    }

    pub fn declares(&self, type_name: &str) -> bool {
        self.declaring_types.contains(type_name)
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// Whether `type_name` is the declaring type or related to it by
    /// sub/supertyping.
    pub fn is_related(&self, type_name: &str) -> bool {
        type_name == self.target_type || self.related_types.contains(type_name)
    }
}
