//! Per-file rewrite state and the final aggregation into a `WorkspaceEdit`.

use std::collections::{BTreeMap, BTreeSet};

use recast_core::{
    apply_text_edits, CancellationToken, FileId, TextEdit, TextRange, WorkspaceEdit,
};
use recast_index::{find_identifier_occurrences, Index};

use crate::error::SignatureChangeError;
use crate::java;

/// How a tracked simple name relates to this rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameDisposition {
    /// A use site was removed; the import may now be unused.
    Removed,
    /// A use site survives; never prune.
    Retained,
    /// Introduced by this rewrite; never prune, maybe import.
    Added,
}

/// Accumulates edits and import intent for exactly one compilation unit.
#[derive(Debug)]
pub(crate) struct RewriteContext {
    file: FileId,
    edits: Vec<TextEdit>,
    /// Fully qualified names to import if the file doesn't already.
    import_additions: BTreeSet<String>,
    /// Simple name -> disposition, keyed by the spans that produced it so a
    /// later pass can re-examine each claim.
    names: BTreeMap<String, Vec<(TextRange, NameDisposition)>>,
}

impl RewriteContext {
    fn new(file: &str) -> Self {
        RewriteContext {
            file: FileId::new(file),
            edits: Vec::new(),
            import_additions: BTreeSet::new(),
            names: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    pub(crate) fn file(&self) -> &FileId {
        &self.file
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Record that the use of `simple` at `span` went away.
    pub(crate) fn mark_removed(&mut self, simple: &str, span: TextRange) {
        self.names
            .entry(simple.to_string())
            .or_default()
            .push((span, NameDisposition::Removed));
    }

    /// Record a surviving use of `simple`.
    pub(crate) fn mark_retained(&mut self, simple: &str, span: TextRange) {
        self.names
            .entry(simple.to_string())
            .or_default()
            .push((span, NameDisposition::Retained));
    }

    /// Record a use introduced by this rewrite. Qualified names are also
    /// queued for an import.
    pub(crate) fn mark_added(&mut self, type_text: &str, span: TextRange) {
        let simple = java::erase_type(type_text);
        // Judge qualification with the varargs ellipsis already gone.
        let base = type_text.trim().trim_end_matches("...").trim_end();
        if base.contains('.') {
            let qualified = base
                .split('<')
                .next()
                .unwrap_or(base)
                .trim_end_matches("[]")
                .trim()
                .to_string();
            self.import_additions.insert(qualified);
        }
        self.names
            .entry(simple)
            .or_default()
            .push((span, NameDisposition::Added));
    }

    fn prune_candidates(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|(_, spans)| {
                spans.iter().any(|(_, d)| *d == NameDisposition::Removed)
                    && spans
                        .iter()
                        .all(|(_, d)| *d != NameDisposition::Retained && *d != NameDisposition::Added)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// One [`RewriteContext`] per file per run; creating the second one for the
/// same file is a bug this map makes impossible.
#[derive(Debug, Default)]
pub(crate) struct ContextMap {
    map: BTreeMap<String, RewriteContext>,
}

impl ContextMap {
    pub(crate) fn context(&mut self, file: &str) -> &mut RewriteContext {
        self.map
            .entry(file.to_string())
            .or_insert_with(|| RewriteContext::new(file))
    }

    /// The structural edits planned so far, per file.
    pub(crate) fn planned(&self) -> impl Iterator<Item = (&str, &[TextEdit])> {
        self.map
            .iter()
            .map(|(file, cx)| (file.as_str(), cx.edits.as_slice()))
    }

    /// Finalize every context: flush structural edits, recompute import use
    /// against the post-edit text, then flush import edits. Files with no
    /// structural edits contribute nothing.
    pub(crate) fn finalize(
        self,
        index: &Index,
        cancel: &CancellationToken,
    ) -> Result<WorkspaceEdit, SignatureChangeError> {
        let mut all = Vec::new();
        for (file, context) in self.map {
            cancel.checkpoint()?;
            if context.is_empty() {
                continue;
            }
            let Some(text) = index.file_text(&file) else {
                continue;
            };

            let mut edits = context.edits.clone();
            edits.extend(import_edits(index, &file, text, &context)?);
            tracing::debug!(file = %file, edits = edits.len(), "finalized rewrite context");
            all.extend(edits);
        }

        let mut edit = WorkspaceEdit::new(all);
        edit.normalize()?;
        Ok(edit)
    }
}

fn import_edits(
    index: &Index,
    file: &str,
    text: &str,
    context: &RewriteContext,
) -> Result<Vec<TextEdit>, SignatureChangeError> {
    let mut edits = Vec::new();
    let imports = index.imports_of(file);

    // Judge import use against the text as it will look after the
    // structural edits, not as it looks now.
    let rewritten = apply_text_edits(text, &context.edits)?;

    for name in context.prune_candidates() {
        let Some(import) = imports
            .iter()
            .find(|i| !i.is_on_demand && !i.is_static && i.simple_name == name)
        else {
            continue;
        };
        // The import statement itself still mentions the name once.
        let uses = find_identifier_occurrences(&rewritten, name).len();
        if uses <= 1 {
            edits.push(
                TextEdit::delete(FileId::new(file), import.range).with_group("imports"),
            );
        }
    }

    for qualified in &context.import_additions {
        let simple = qualified.rsplit('.').next().unwrap_or(qualified);
        let already = imports
            .iter()
            .any(|i| i.path == *qualified || (!i.is_static && i.simple_name == simple));
        if already || qualified.starts_with("java.lang.") {
            continue;
        }
        let offset = import_insert_offset(index, file, text);
        edits.push(
            TextEdit::insert(FileId::new(file), offset, format!("import {qualified};\n"))
                .with_group("imports"),
        );
    }

    Ok(edits)
}

fn import_insert_offset(index: &Index, file: &str, text: &str) -> usize {
    if let Some(last) = index.imports_of(file).last() {
        return last.range.end;
    }
    if index.package_of(file).is_some() {
        if let Some(semi) = text.find(';') {
            let mut offset = semi + 1;
            let bytes = text.as_bytes();
            if bytes.get(offset) == Some(&b'\n') {
                offset += 1;
            }
            return offset;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Files;

    fn index_of(file: &str, text: &str) -> Index {
        let mut files = Files::new();
        files.insert(file.to_string(), text.to_string());
        Index::new(files)
    }

    #[test]
    fn prunes_import_when_last_use_is_removed() {
        let src = "import java.io.IOException;\n\nclass A {\n    void f() throws IOException {}\n}\n";
        let index = index_of("A.java", src);
        let mut contexts = ContextMap::default();
        let cx = contexts.context("A.java");

        let throws_start = src.find(" throws IOException").unwrap();
        let throws_range = TextRange::new(throws_start, throws_start + " throws IOException".len());
        cx.push(TextEdit::delete(FileId::new("A.java"), throws_range).with_group("signature"));
        cx.mark_removed("IOException", throws_range);

        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();
        let after = apply_text_edits(src, &edit.edits).unwrap();
        assert!(!after.contains("import java.io.IOException;"));
        assert!(!after.contains("throws"));
    }

    #[test]
    fn keeps_import_with_surviving_use() {
        let src = "import java.io.IOException;\n\nclass A {\n    void f() throws IOException {}\n    void g() throws IOException {}\n}\n";
        let index = index_of("A.java", src);
        let mut contexts = ContextMap::default();
        let cx = contexts.context("A.java");

        let throws_start = src.find(" throws IOException").unwrap();
        let throws_range = TextRange::new(throws_start, throws_start + " throws IOException".len());
        cx.push(TextEdit::delete(FileId::new("A.java"), throws_range).with_group("signature"));
        cx.mark_removed("IOException", throws_range);

        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();
        let after = apply_text_edits(src, &edit.edits).unwrap();
        assert!(after.contains("import java.io.IOException;"));
        assert!(after.contains("void g() throws IOException"));
    }

    #[test]
    fn adds_import_for_qualified_added_type() {
        let src = "package p;\n\nclass A {\n    void f() {}\n}\n";
        let index = index_of("A.java", src);
        let mut contexts = ContextMap::default();
        let cx = contexts.context("A.java");

        let offset = src.find("void").unwrap();
        cx.push(TextEdit::insert(FileId::new("A.java"), offset, "// x\n    "));
        cx.mark_added("java.util.List<String>", TextRange::empty(offset));

        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();
        let after = apply_text_edits(src, &edit.edits).unwrap();
        assert!(after.contains("import java.util.List;\n"));
    }

    #[test]
    fn unqualified_vararg_type_queues_no_import() {
        let src = "package p;\n\nclass A {\n    void f() {}\n}\n";
        let index = index_of("A.java", src);
        let mut contexts = ContextMap::default();
        let cx = contexts.context("A.java");

        let offset = src.find("void").unwrap();
        cx.push(TextEdit::insert(FileId::new("A.java"), offset, "// x\n    "));
        cx.mark_added("String...", TextRange::empty(offset));
        cx.mark_added("java.nio.file.Path...", TextRange::empty(offset));

        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();
        let after = apply_text_edits(src, &edit.edits).unwrap();
        assert!(!after.contains("import String"));
        assert!(after.contains("import java.nio.file.Path;\n"));
    }

    #[test]
    fn untouched_files_contribute_nothing() {
        let index = index_of("A.java", "class A {}\n");
        let mut contexts = ContextMap::default();
        contexts.context("A.java");
        let edit = contexts
            .finalize(&index, &CancellationToken::new())
            .unwrap();
        assert!(edit.is_empty());
    }
}
