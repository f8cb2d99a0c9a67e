//! Keeping subclasses compilable when a no-arg constructor starts
//! requiring arguments: an implicit `super()` call no longer resolves, so
//! every direct named subclass either gains an explicit chained call or a
//! synthesized constructor.

use recast_core::TextEdit;
use recast_index::{Index, Symbol};

use crate::advisor::{value_for_added, AdvisorContext};
use crate::context::ContextMap;
use crate::java;
use crate::occurrence::chained_call;
use crate::signature::MethodSignatureChange;
use crate::update::UpdateEnv;

/// True when the change turns the target (a constructor) from no-arg into
/// argument-requiring.
pub(crate) fn requires_propagation(index: &Index, change: &MethodSignatureChange) -> bool {
    let Some(details) = change.target_details(index) else {
        return false;
    };
    if !details.is_constructor || !details.params.is_empty() {
        return false;
    }
    change
        .retained_parameters()
        .any(|p| !(p.is_new_varargs && p.default_value.is_none()))
}

pub(crate) fn propagate_to_subclasses(env: &UpdateEnv<'_>, contexts: &mut ContextMap) {
    let index = env.index;
    let target_type = env.cache.target_type().to_string();

    for sub in index.direct_subtypes(&target_type) {
        let Some(type_symbol) = index.type_symbol(sub) else {
            continue;
        };
        let ctors = index.constructors_of(sub);
        if ctors.is_empty() {
            synthesize_constructor(env, type_symbol, contexts);
            continue;
        }
        for ctor in ctors {
            insert_explicit_super(env, ctor, contexts);
        }
    }
}

fn synthesized_arguments(env: &UpdateEnv<'_>, enclosing: Option<&Symbol>, file: &str) -> String {
    let no_args: Vec<String> = Vec::new();
    env.change
        .retained_parameters()
        .filter_map(|param| {
            let cx = AdvisorContext {
                call_args: &no_args,
                parameters: &env.change.parameters,
                enclosing_method: enclosing,
                is_recursive: false,
                file,
            };
            value_for_added(param, env.advisor, &cx)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The subclass relied on the implicit default constructor. Emit one that
/// chains up explicitly.
fn synthesize_constructor(env: &UpdateEnv<'_>, type_symbol: &Symbol, contexts: &mut ContextMap) {
    let index = env.index;
    let Some(body) = type_symbol.body_range else {
        return;
    };
    let Some(text) = index.file_text(&type_symbol.file) else {
        return;
    };
    let cx = contexts.context(&type_symbol.file);
    let file = cx.file().clone();

    let class_indent = java::line_indent(text, type_symbol.decl_range.start);
    let indent = format!("{class_indent}    ");
    let visibility = type_symbol
        .visibility
        .keyword()
        .map(|kw| format!("{kw} "))
        .unwrap_or_default();
    let args = synthesized_arguments(env, None, &type_symbol.file);

    let ctor = format!(
        "\n{indent}{visibility}{name}() {{\n{indent}    super({args});\n{indent}}}\n",
        name = type_symbol.name,
    );
    cx.push(TextEdit::insert(file, body.start, ctor).with_group("constructor"));
}

/// A declared constructor with no explicit chained call gets `super(...)`
/// as its new first statement. Constructors that already chain are handled
/// as ordinary call occurrences.
fn insert_explicit_super(env: &UpdateEnv<'_>, ctor: &Symbol, contexts: &mut ContextMap) {
    let index = env.index;
    if chained_call(index, ctor).is_some() {
        return;
    }
    let Some(body) = ctor.body_range else {
        return;
    };
    let Some(text) = index.file_text(&ctor.file) else {
        return;
    };
    let cx = contexts.context(&ctor.file);
    let file = cx.file().clone();

    let indent = format!("{}    ", java::line_indent(text, ctor.decl_range.start));
    let args = synthesized_arguments(env, Some(ctor), &ctor.file);
    let stmt = format!("\n{indent}super({args});");
    cx.push(TextEdit::insert(file, body.start, stmt).with_group("constructor"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyCache;
    use crate::signature::{MethodSignatureChange, ParameterChange};
    use crate::visibility::VisibilityAdjustor;
    use recast_core::CancellationToken;
    use std::collections::BTreeMap;

    fn env_fixture() -> (Index, MethodSignatureChange) {
        let mut files = BTreeMap::new();
        files.insert(
            "Base.java".to_string(),
            "class Base {\n    Base() {\n    }\n}\n".to_string(),
        );
        files.insert(
            "Sub.java".to_string(),
            "class Sub extends Base {\n    Sub() {\n        int x = 1;\n    }\n}\n".to_string(),
        );
        files.insert(
            "Leaf.java".to_string(),
            "class Leaf extends Base {\n    void use() {\n    }\n}\n".to_string(),
        );
        let index = Index::new(files);
        let target = index.constructors_of("Base")[0].id;
        let mut change = MethodSignatureChange::from_declaration(&index, target.into())
            .expect("constructor resolves");
        change.parameters.push(ParameterChange::add("int", "size", Some("0")));
        (index, change)
    }

    #[test]
    fn no_arg_to_arg_constructor_updates_every_direct_subclass() {
        let (index, change) = env_fixture();
        let target = change.target.symbol_id();
        let symbol = index.symbol(target).unwrap();
        let cache = HierarchyCache::new(&index, symbol);
        let adjustor = VisibilityAdjustor::default();
        let env = UpdateEnv {
            index: &index,
            change: &change,
            cache: &cache,
            advisor: None,
            adjustor: &adjustor,
            family_top: target,
        };
        assert!(requires_propagation(&index, &change));

        let mut contexts = ContextMap::default();
        propagate_to_subclasses(&env, &mut contexts);
        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();

        let by_file = edit.edits_by_file();
        let sub_edits = &by_file[&recast_core::FileId::new("Sub.java")];
        assert!(sub_edits.iter().any(|e| e.replacement.contains("super(0);")));
        let leaf_edits = &by_file[&recast_core::FileId::new("Leaf.java")];
        assert!(leaf_edits
            .iter()
            .any(|e| e.replacement.contains("Leaf() {") && e.replacement.contains("super(0);")));
    }
}
