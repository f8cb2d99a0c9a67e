use similar::TextDiff;

use recast_core::{apply_text_edits, EditError, FileId, WorkspaceEdit};
use recast_index::Index;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePreview {
    pub file: FileId,
    pub original: String,
    pub modified: String,
    pub unified_diff: String,
    pub edit_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefactoringPreview {
    pub total_files: usize,
    pub total_edits: usize,
    pub files: Vec<FilePreview>,
}

/// Render a workspace edit as per-file unified diffs without touching any
/// file on disk.
pub fn generate_preview(
    index: &Index,
    edit: &WorkspaceEdit,
) -> Result<RefactoringPreview, EditError> {
    let mut normalized = edit.clone();
    normalized.normalize()?;

    let mut files = Vec::new();
    for (file, edits) in normalized.edits_by_file() {
        let Some(original) = index.file_text(file.as_str()) else {
            continue;
        };
        let owned: Vec<_> = edits.iter().map(|e| (*e).clone()).collect();
        let modified = apply_text_edits(original, &owned)?;
        if modified == original {
            continue;
        }

        let diff = TextDiff::from_lines(original, modified.as_str());
        let unified_diff = diff
            .unified_diff()
            .context_radius(3)
            .header(
                &format!("a/{}", file.as_str()),
                &format!("b/{}", file.as_str()),
            )
            .to_string();

        files.push(FilePreview {
            file: file.clone(),
            original: original.to_string(),
            modified,
            unified_diff,
            edit_count: owned.len(),
        });
    }

    Ok(RefactoringPreview {
        total_files: files.len(),
        total_edits: normalized.edits.len(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::{TextEdit, TextRange};
    use std::collections::BTreeMap;

    #[test]
    fn preview_shows_a_unified_diff_per_changed_file() {
        let mut sources = BTreeMap::new();
        sources.insert(
            "A.java".to_string(),
            "class A {\n    void run() {\n    }\n}\n".to_string(),
        );
        let index = Index::new(sources);

        let method = index.methods_of("A", "run")[0];
        let edit = WorkspaceEdit::new(vec![TextEdit::replace(
            FileId::new("A.java"),
            method.name_range,
            "execute",
        )]);

        let preview = generate_preview(&index, &edit).expect("previews");
        assert_eq!(preview.total_files, 1);
        assert_eq!(preview.total_edits, 1);
        assert!(preview.files[0].unified_diff.contains("-    void run() {"));
        assert!(preview.files[0].unified_diff.contains("+    void execute() {"));
    }
}
