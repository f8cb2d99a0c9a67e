use std::collections::{BTreeMap, BTreeSet, VecDeque};

use recast_core::TextRange;

use crate::scan::find_identifier_occurrences;
use crate::sketch::{self, ParsedType};
use crate::symbols::{
    ImportDecl, MethodDetails, ReferenceCandidate, ReferenceKind, Symbol, SymbolId, SymbolKind,
    TypeKind, Visibility,
};

/// A lexical index over a set of Java source files.
///
/// Built by sketch-parsing every file up front; lookups afterwards are cheap.
/// Resolution is by simple type name, which is the best a lexical index can
/// do; callers are expected to verify candidates against the declarations
/// they actually care about.
#[derive(Debug, Default)]
pub struct Index {
    files: BTreeMap<String, String>,
    symbols: Vec<Symbol>,
    details: BTreeMap<SymbolId, MethodDetails>,
    packages: BTreeMap<String, String>,
    imports: BTreeMap<String, Vec<ImportDecl>>,
    type_ids: BTreeMap<String, SymbolId>,
    type_kinds: BTreeMap<String, TypeKind>,
    /// Direct supertypes (extends and implements), by simple name.
    supers: BTreeMap<String, Vec<String>>,
    /// Direct subtypes, the reverse of `supers`.
    subs: BTreeMap<String, Vec<String>>,
}

impl Index {
    pub fn new(files: BTreeMap<String, String>) -> Self {
        let mut index = Index {
            files,
            ..Index::default()
        };

        let parsed: Vec<(String, sketch::ParsedFile)> = index
            .files
            .iter()
            .map(|(file, text)| (file.clone(), sketch::parse_file(file, text)))
            .collect();

        for (file, parsed_file) in parsed {
            if let Some(pkg) = parsed_file.package {
                index.packages.insert(file.clone(), pkg);
            }
            index.imports.insert(file.clone(), parsed_file.imports);
            for ty in parsed_file.types {
                index.add_type(&file, ty);
            }
        }

        let edges: Vec<(String, String)> = index
            .supers
            .iter()
            .flat_map(|(name, supers)| supers.iter().map(|sup| (sup.clone(), name.clone())))
            .collect();
        for (sup, name) in edges {
            index.subs.entry(sup).or_default().push(name);
        }

        tracing::debug!(
            files = index.files.len(),
            symbols = index.symbols.len(),
            "indexed workspace"
        );
        index
    }

    fn add_type(&mut self, file: &str, ty: ParsedType) {
        let type_id = SymbolId(self.symbols.len() as u32);
        let mut supers = Vec::new();
        if let Some(sup) = &ty.extends {
            supers.push(sup.clone());
        }
        supers.extend(ty.implements.iter().cloned());
        supers.extend(ty.extends_interfaces.iter().cloned());

        self.type_ids.entry(ty.name.clone()).or_insert(type_id);
        self.type_kinds.entry(ty.name.clone()).or_insert(ty.kind);
        if !supers.is_empty() {
            self.supers.entry(ty.name.clone()).or_default().extend(supers);
        }

        self.symbols.push(Symbol {
            id: type_id,
            kind: SymbolKind::Type,
            name: ty.name.clone(),
            container: ty.container.clone(),
            file: file.to_string(),
            name_range: ty.name_range,
            decl_range: ty.decl_range,
            doc_range: ty.doc_range,
            body_range: ty.body_range,
            visibility: ty.visibility,
            is_override: false,
            param_types: Vec::new(),
            param_names: Vec::new(),
            extends: ty.extends.clone(),
        });

        for method in ty.methods {
            let id = SymbolId(self.symbols.len() as u32);
            self.symbols.push(Symbol {
                id,
                kind: SymbolKind::Method,
                name: method.name,
                container: Some(ty.name.clone()),
                file: file.to_string(),
                name_range: method.name_range,
                decl_range: method.decl_range,
                doc_range: method.doc_range,
                body_range: method.body_range,
                visibility: method.visibility,
                is_override: method.is_override,
                param_types: method.details.params.iter().map(|p| p.ty.clone()).collect(),
                param_names: method
                    .details
                    .params
                    .iter()
                    .map(|p| p.name.clone())
                    .collect(),
                extends: None,
            });
            self.details.insert(id, method.details);
        }

        for field in ty.fields {
            let id = SymbolId(self.symbols.len() as u32);
            self.symbols.push(Symbol {
                id,
                kind: SymbolKind::Field,
                name: field.name,
                container: Some(ty.name.clone()),
                file: file.to_string(),
                name_range: field.name_range,
                decl_range: field.decl_range,
                doc_range: None,
                body_range: None,
                visibility: field.visibility,
                is_override: false,
                param_types: Vec::new(),
                param_names: Vec::new(),
                extends: None,
            });
        }

        for constant in ty.enum_constants {
            let id = SymbolId(self.symbols.len() as u32);
            self.symbols.push(Symbol {
                id,
                kind: SymbolKind::EnumConstant,
                name: constant.name,
                container: Some(ty.name.clone()),
                file: file.to_string(),
                name_range: constant.name_range,
                decl_range: constant.decl_range,
                doc_range: None,
                body_range: None,
                visibility: Visibility::Public,
                is_override: false,
                param_types: Vec::new(),
                param_names: Vec::new(),
                extends: None,
            });
        }
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn file_text(&self, file: &str) -> Option<&str> {
        self.files.get(file).map(String::as_str)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn symbols_in_file<'a>(&'a self, file: &str) -> impl Iterator<Item = &'a Symbol> + 'a {
        let file = file.to_string();
        self.symbols.iter().filter(move |s| s.file == file)
    }

    pub fn method_details(&self, id: SymbolId) -> Option<&MethodDetails> {
        self.details.get(&id)
    }

    pub fn package_of(&self, file: &str) -> Option<&str> {
        self.packages.get(file).map(String::as_str)
    }

    pub fn imports_of(&self, file: &str) -> &[ImportDecl] {
        self.imports.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn type_symbol(&self, name: &str) -> Option<&Symbol> {
        self.type_ids.get(name).and_then(|id| self.symbol(*id))
    }

    pub fn type_kind(&self, name: &str) -> Option<TypeKind> {
        self.type_kinds.get(name).copied()
    }

    pub fn is_interface(&self, name: &str) -> bool {
        matches!(self.type_kind(name), Some(TypeKind::Interface))
    }

    /// Direct superclass of a class, if declared.
    pub fn super_of(&self, type_name: &str) -> Option<&str> {
        self.type_symbol(type_name)
            .and_then(|s| s.extends.as_deref())
    }

    /// Direct supertypes: superclass plus implemented/extended interfaces.
    pub fn supers_of(&self, type_name: &str) -> &[String] {
        self.supers.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn direct_subtypes(&self, type_name: &str) -> &[String] {
        self.subs.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All transitive subtypes of `root`, excluding `root` itself.
    pub fn all_subtypes(&self, root: &str) -> Vec<String> {
        self.closure(root, &self.subs)
    }

    /// All transitive supertypes of `root`, excluding `root` itself.
    pub fn all_supertypes(&self, root: &str) -> Vec<String> {
        self.closure(root, &self.supers)
    }

    fn closure(&self, root: &str, edges: &BTreeMap<String, Vec<String>>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(root.to_string());
        let mut out = Vec::new();
        while let Some(name) = queue.pop_front() {
            if let Some(next) = edges.get(&name) {
                for n in next {
                    if seen.insert(n.clone()) {
                        out.push(n.clone());
                        queue.push_back(n.clone());
                    }
                }
            }
        }
        out
    }

    /// Methods named `name` declared directly on `type_name`.
    pub fn methods_of(&self, type_name: &str, name: &str) -> Vec<&Symbol> {
        self.symbols
            .iter()
            .filter(|s| {
                s.kind == SymbolKind::Method
                    && s.name == name
                    && s.container.as_deref() == Some(type_name)
            })
            .collect()
    }

    /// All methods declared directly on `type_name`.
    pub fn all_methods_of(&self, type_name: &str) -> Vec<&Symbol> {
        self.symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Method && s.container.as_deref() == Some(type_name))
            .collect()
    }

    /// Constructors of `type_name`.
    pub fn constructors_of(&self, type_name: &str) -> Vec<&Symbol> {
        self.methods_of(type_name, type_name)
            .into_iter()
            .filter(|s| {
                self.details
                    .get(&s.id)
                    .is_some_and(|d| d.is_constructor)
            })
            .collect()
    }

    /// Declarations in subtypes that override `method` (same name, same
    /// arity), transitively.
    pub fn find_overrides(&self, method: &Symbol) -> Vec<&Symbol> {
        let Some(declaring) = method.container.as_deref() else {
            return Vec::new();
        };
        let arity = method.param_types.len();
        let mut out = Vec::new();
        for sub in self.all_subtypes(declaring) {
            for candidate in self.methods_of(&sub, &method.name) {
                if candidate.param_types.len() == arity {
                    out.push(candidate);
                }
            }
        }
        out
    }

    /// Declarations in supertypes that `method` overrides, transitively.
    pub fn find_overridden(&self, method: &Symbol) -> Vec<&Symbol> {
        let Some(declaring) = method.container.as_deref() else {
            return Vec::new();
        };
        let arity = method.param_types.len();
        let mut out = Vec::new();
        for sup in self.all_supertypes(declaring) {
            for candidate in self.methods_of(&sup, &method.name) {
                if candidate.param_types.len() == arity {
                    out.push(candidate);
                }
            }
        }
        out
    }

    /// The full override ripple of `method`: the topmost declarations it
    /// overrides, every declaration overriding those, and `method` itself.
    pub fn override_group(&self, method: &Symbol) -> Vec<&Symbol> {
        let mut ids = BTreeSet::new();
        ids.insert(method.id);
        let mut roots = self.find_overridden(method);
        if roots.is_empty() {
            roots.push(method);
        }
        for root in roots {
            ids.insert(root.id);
            for sub in self.find_overrides(root) {
                ids.insert(sub.id);
            }
        }
        ids.into_iter().filter_map(|id| self.symbol(id)).collect()
    }

    /// Innermost type declaration containing `offset` in `file`.
    pub fn enclosing_type_at(&self, file: &str, offset: usize) -> Option<&Symbol> {
        self.symbols_in_file(file)
            .filter(|s| s.kind == SymbolKind::Type && s.decl_range.contains(offset))
            .min_by_key(|s| s.decl_range.len())
    }

    /// Innermost method or constructor declaration containing `offset`.
    pub fn enclosing_method_at(&self, file: &str, offset: usize) -> Option<&Symbol> {
        self.symbols_in_file(file)
            .filter(|s| s.kind == SymbolKind::Method && s.decl_range.contains(offset))
            .min_by_key(|s| s.decl_range.len())
    }

    /// Every whole-word occurrence of `name` across the workspace, roughly
    /// classified by its lexical surroundings. Declaration name ranges are
    /// included; callers filter those out against the symbols they hold.
    pub fn find_name_candidates(&self, name: &str) -> Vec<ReferenceCandidate> {
        let mut out = Vec::new();
        for (file, text) in &self.files {
            let imports = self.imports_of(file);
            for occ in find_identifier_occurrences(text, name) {
                let kind = self.classify(text, imports, occ.range, occ.in_doc_comment);
                out.push(ReferenceCandidate {
                    file: file.clone(),
                    range: occ.range,
                    kind,
                });
            }
        }
        out
    }

    fn classify(
        &self,
        text: &str,
        imports: &[ImportDecl],
        range: TextRange,
        in_doc_comment: bool,
    ) -> ReferenceKind {
        if let Some(import) = imports.iter().find(|i| i.range.contains(range.start)) {
            return if import.is_static {
                ReferenceKind::StaticImport
            } else {
                ReferenceKind::TypeUsage
            };
        }
        if in_doc_comment {
            return ReferenceKind::DocReference;
        }

        let bytes = text.as_bytes();
        if range.start >= 2 && &bytes[range.start - 2..range.start] == b"::" {
            return ReferenceKind::MethodRef;
        }
        if next_non_ws(bytes, range.end) == Some(b'(') {
            return ReferenceKind::Call;
        }
        if prev_non_ws(bytes, range.start) == Some(b'.') {
            return ReferenceKind::FieldAccess;
        }
        ReferenceKind::Unknown
    }
}

fn next_non_ws(bytes: &[u8], mut i: usize) -> Option<u8> {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    bytes.get(i).copied()
}

fn prev_non_ws(bytes: &[u8], mut i: usize) -> Option<u8> {
    while i > 0 && bytes[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    if i == 0 {
        None
    } else {
        Some(bytes[i - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(files: Vec<(&str, &str)>) -> Index {
        Index::new(
            files
                .into_iter()
                .map(|(f, t)| (f.to_string(), t.to_string()))
                .collect(),
        )
    }

    #[test]
    fn resolves_hierarchy_across_files() {
        let index = build(vec![
            (
                "Base.java",
                "public class Base { public void go(int n) {} }",
            ),
            (
                "Mid.java",
                "public class Mid extends Base { @Override public void go(int n) {} }",
            ),
            ("Leaf.java", "public class Leaf extends Mid { }"),
        ]);

        assert_eq!(
            index.all_subtypes("Base"),
            vec!["Mid".to_string(), "Leaf".to_string()]
        );
        assert_eq!(index.super_of("Mid"), Some("Base"));

        let base_go = index.methods_of("Base", "go")[0];
        let overrides = index.find_overrides(base_go);
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].container.as_deref(), Some("Mid"));
        assert!(overrides[0].is_override);

        let mid_go = index.methods_of("Mid", "go")[0];
        let group = index.override_group(mid_go);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn classifies_reference_candidates() {
        let index = build(vec![
            (
                "Util.java",
                "public class Util { public static int twice(int n) { return n * 2; } }",
            ),
            (
                "Main.java",
                r#"import static Util.twice;

public class Main {
    /** Uses {@link Util#twice(int)}. */
    void run() {
        int a = twice(3);
        java.util.function.IntUnaryOperator f = Util::twice;
    }
}
"#,
            ),
        ]);

        let candidates = index.find_name_candidates("twice");
        let kinds_in_main: Vec<ReferenceKind> = candidates
            .iter()
            .filter(|c| c.file == "Main.java")
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds_in_main,
            vec![
                ReferenceKind::StaticImport,
                ReferenceKind::DocReference,
                ReferenceKind::Call,
                ReferenceKind::MethodRef,
            ]
        );
    }

    #[test]
    fn finds_enclosing_declarations() {
        let src = "class A { void f() { int x = 1; } }";
        let index = build(vec![("A.java", src)]);
        let offset = src.find("int x").unwrap();
        assert_eq!(index.enclosing_type_at("A.java", offset).unwrap().name, "A");
        assert_eq!(
            index.enclosing_method_at("A.java", offset).unwrap().name,
            "f"
        );
    }

    #[test]
    fn constructor_lookup_uses_details() {
        let index = build(vec![(
            "Box.java",
            "class Box { Box(int n) {} static Box of(int n) { return new Box(n); } }",
        )]);
        let ctors = index.constructors_of("Box");
        assert_eq!(ctors.len(), 1);
        assert!(index.method_details(ctors[0].id).unwrap().is_constructor);
    }
}
