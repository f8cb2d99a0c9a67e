use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::TextRange;

/// Identifier for a workspace file.
///
/// Kept as a plain path/URI string; an interned id would work just as well
/// but makes test output harder to read.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single file edit: replace `range` with `replacement`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub file: FileId,
    pub range: TextRange,
    pub replacement: String,
    /// Named edit group for preview UIs. Purely informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl TextEdit {
    pub fn insert(file: FileId, offset: usize, text: impl Into<String>) -> Self {
        Self {
            file,
            range: TextRange::empty(offset),
            replacement: text.into(),
            group: None,
        }
    }

    pub fn replace(file: FileId, range: TextRange, text: impl Into<String>) -> Self {
        Self {
            file,
            range,
            replacement: text.into(),
            group: None,
        }
    }

    pub fn delete(file: FileId, range: TextRange) -> Self {
        Self {
            file,
            range,
            replacement: String::new(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A set of edits across potentially multiple files.
///
/// Edits must be normalized (sorted, deduplicated, non-overlapping) before
/// being applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEdit {
    pub edits: Vec<TextEdit>,
}

impl WorkspaceEdit {
    pub fn new(edits: Vec<TextEdit>) -> Self {
        Self { edits }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Returns edits grouped by file in deterministic order.
    pub fn edits_by_file(&self) -> BTreeMap<&FileId, Vec<&TextEdit>> {
        let mut map: BTreeMap<&FileId, Vec<&TextEdit>> = BTreeMap::new();
        for edit in &self.edits {
            map.entry(&edit.file).or_default().push(edit);
        }
        for edits in map.values_mut() {
            edits.sort_by(|a, b| {
                a.range
                    .start
                    .cmp(&b.range.start)
                    .then_with(|| a.range.end.cmp(&b.range.end))
            });
        }
        map
    }

    /// Normalize edits: sort, drop exact duplicates, merge same-position
    /// inserts, and validate non-overlap per file.
    pub fn normalize(&mut self) -> Result<(), EditError> {
        self.edits.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then_with(|| a.range.start.cmp(&b.range.start))
                .then_with(|| a.range.end.cmp(&b.range.end))
                .then_with(|| a.replacement.cmp(&b.replacement))
        });

        self.edits.dedup_by(|a, b| {
            a.file == b.file && a.range == b.range && a.replacement == b.replacement
        });

        let mut merged: Vec<TextEdit> = Vec::with_capacity(self.edits.len());
        for edit in self.edits.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.file == edit.file && last.range == edit.range && last.range.is_empty() {
                    last.replacement.push_str(&edit.replacement);
                    continue;
                }
                if last.file == edit.file && last.range == edit.range {
                    return Err(EditError::OverlappingEdits {
                        file: edit.file,
                        first: last.range,
                        second: edit.range,
                    });
                }
            }
            merged.push(edit);
        }
        self.edits = merged;

        let mut current_file: Option<&FileId> = None;
        let mut prev: Option<TextRange> = None;
        for edit in &self.edits {
            if current_file.map(|f| f != &edit.file).unwrap_or(true) {
                current_file = Some(&edit.file);
                prev = None;
            }
            if let Some(prev_range) = prev {
                if edit.range.start < prev_range.end {
                    return Err(EditError::OverlappingEdits {
                        file: edit.file.clone(),
                        first: prev_range,
                        second: edit.range,
                    });
                }
            }
            prev = Some(edit.range);
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("invalid text range {range:?} in {file:?}")]
    InvalidRange { file: FileId, range: TextRange },
    #[error("overlapping edits in {file:?}: {first:?} overlaps {second:?}")]
    OverlappingEdits {
        file: FileId,
        first: TextRange,
        second: TextRange,
    },
    #[error("text edit range {range:?} is outside the file bounds (len={len}) in {file:?}")]
    OutOfBounds {
        file: FileId,
        range: TextRange,
        len: usize,
    },
}

/// Apply a set of non-overlapping edits to `original` and return the result.
pub fn apply_text_edits(original: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(original.to_string());
    }

    let mut sorted = edits.to_vec();
    sorted.sort_by(|a, b| {
        b.range
            .start
            .cmp(&a.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });

    let mut out = original.to_string();
    for edit in sorted {
        let len = out.len();
        if edit.range.end > len || edit.range.start > edit.range.end {
            return Err(EditError::OutOfBounds {
                file: edit.file,
                range: edit.range,
                len,
            });
        }
        out.replace_range(edit.range.start..edit.range.end, &edit.replacement);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_overlap() {
        let file = FileId::new("A.java");
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::replace(file.clone(), TextRange::new(0, 4), "x"),
            TextEdit::replace(file.clone(), TextRange::new(2, 6), "y"),
        ]);
        assert!(matches!(
            edit.normalize(),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn normalize_merges_same_position_inserts() {
        let file = FileId::new("A.java");
        let mut edit = WorkspaceEdit::new(vec![
            TextEdit::insert(file.clone(), 2, "a"),
            TextEdit::insert(file.clone(), 2, "b"),
        ]);
        edit.normalize().unwrap();
        assert_eq!(edit.edits.len(), 1);
        assert_eq!(edit.edits[0].replacement, "ab");
    }

    #[test]
    fn apply_edits_back_to_front() {
        let file = FileId::new("A.java");
        let edits = vec![
            TextEdit::replace(file.clone(), TextRange::new(0, 3), "bar"),
            TextEdit::replace(file.clone(), TextRange::new(4, 5), "2"),
        ];
        assert_eq!(apply_text_edits("foo(1)", &edits).unwrap(), "bar(2)");
    }
}
