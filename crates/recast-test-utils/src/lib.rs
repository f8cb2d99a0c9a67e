//! Utilities shared by fixture-based tests across the workspace.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use recast_core::{apply_text_edits, WorkspaceEdit};
use recast_index::Index;

/// Install a log subscriber for a test run, filtered by `RECAST_LOG`.
/// Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("RECAST_LOG"))
        .with_test_writer()
        .try_init();
}

/// Build an [`Index`] over inline fixture files.
pub fn build_index(files: &[(&str, &str)]) -> Index {
    let map: BTreeMap<String, String> = files
        .iter()
        .map(|(path, text)| (path.to_string(), text.to_string()))
        .collect();
    Index::new(map)
}

/// Apply `edit` to the indexed sources and return the resulting file map.
///
/// Panics on overlapping or out-of-bounds edits; fixture tests want the
/// loud failure.
pub fn apply_workspace_edit(index: &Index, edit: &WorkspaceEdit) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = index
        .files()
        .map(|(file, text)| (file.to_string(), text.to_string()))
        .collect();

    for (file, edits) in edit.edits_by_file() {
        let original = out
            .get(file.as_str())
            .unwrap_or_else(|| panic!("edit targets unknown file {}", file.as_str()));
        let owned: Vec<_> = edits.iter().map(|e| (*e).clone()).collect();
        let rewritten = apply_text_edits(original, &owned).expect("edits apply cleanly");
        out.insert(file.as_str().to_string(), rewritten);
    }
    out
}

/// Extract a cursor offset from a fixture containing a `/*caret*/` marker.
/// Returns the fixture with the marker removed and the offset it stood at.
pub fn extract_caret(fixture: &str) -> (String, usize) {
    let marker = "/*caret*/";
    let offset = fixture
        .find(marker)
        .expect("fixture missing /*caret*/ marker");
    let mut text = String::with_capacity(fixture.len() - marker.len());
    text.push_str(&fixture[..offset]);
    text.push_str(&fixture[offset + marker.len()..]);
    (text, offset)
}

/// Materialize fixture files into a fresh temp directory, for tests that
/// need real paths. The directory lives as long as the returned guard.
pub fn fixture_dir(files: &[(&str, &str)]) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("create fixture dir");
    let mut paths = Vec::new();
    for (name, text) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture subdir");
        }
        fs::write(&path, text).expect("write fixture file");
        tracing::debug!(path = %path.display(), "wrote fixture file");
        paths.push(path);
    }
    (dir, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_marker_is_removed_and_located() {
        let (text, offset) = extract_caret("class A { void /*caret*/run() {} }");
        assert_eq!(offset, 15);
        assert_eq!(text, "class A { void run() {} }");
    }
}
