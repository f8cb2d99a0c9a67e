//! The shared reorder core: given the old comma-separated item texts and the
//! ordered parameter plan, produce the new item texts, then turn old-vs-new
//! into minimal positional edits.

use recast_core::{FileId, TextEdit, TextRange};
use recast_index::split_top_level_ranges;

use crate::signature::ParameterChange;

/// Build the new argument list for a call-like occurrence.
///
/// Vararg-aware: a retained vararg parameter moves the whole argument tail
/// that feeds it, a deleted vararg drops the tail. Added parameters are
/// synthesized through `synth`; returning `None` (the empty vararg default)
/// contributes no argument.
pub(crate) fn reshuffle_args<F>(
    old_args: &[String],
    params: &[ParameterChange],
    mut synth: F,
) -> Vec<String>
where
    F: FnMut(&ParameterChange) -> Option<String>,
{
    let mut out = Vec::new();
    for param in params.iter().filter(|p| !p.deleted) {
        match param.old_index {
            Some(index) if param.is_old_varargs => {
                // The vararg absorbed everything from its position on.
                if index < old_args.len() {
                    out.extend(old_args[index..].iter().cloned());
                }
            }
            Some(index) => {
                if let Some(arg) = old_args.get(index) {
                    out.push(arg.clone());
                }
            }
            None => {
                if let Some(value) = synth(param) {
                    out.push(value);
                }
            }
        }
    }
    out
}

/// Build the new item list for a declaration-like occurrence (one item per
/// parameter, varargs not expanded). `render` produces the text of one
/// parameter; `old_items` are the current texts by old index, used verbatim
/// for untouched parameters.
pub(crate) fn reshuffle_decl<F>(
    old_items: &[String],
    params: &[ParameterChange],
    mut render: F,
) -> Vec<String>
where
    F: FnMut(&ParameterChange, Option<&str>) -> String,
{
    params
        .iter()
        .filter(|p| !p.deleted)
        .map(|param| {
            let old = param
                .old_index
                .and_then(|i| old_items.get(i))
                .map(String::as_str);
            render(param, old)
        })
        .collect()
}

/// Text of the parsed items of a comma-separated list, with their ranges in
/// file coordinates.
pub(crate) fn list_items(text: &str, list: TextRange) -> (Vec<String>, Vec<TextRange>) {
    let src = &text[list.start..list.end];
    if src.trim().is_empty() {
        return (Vec::new(), Vec::new());
    }
    let mut items = Vec::new();
    let mut ranges = Vec::new();
    for piece in split_top_level_ranges(src, ',') {
        let raw = &src[piece.start..piece.end];
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        items.push(trimmed.to_string());
        ranges.push(TextRange::new(
            list.start + piece.start + leading,
            list.start + piece.start + leading + trimmed.len(),
        ));
    }
    (items, ranges)
}

/// Minimal positional edits turning the old list into the new one: replace
/// slots where both exist and differ, delete the trailing old-only slots,
/// append the trailing new-only slots.
pub(crate) fn positional_list_edits(
    file: &FileId,
    list: TextRange,
    old_items: &[String],
    old_ranges: &[TextRange],
    new_items: &[String],
    group: &str,
) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    let shared = old_items.len().min(new_items.len());

    for i in 0..shared {
        if old_items[i] != new_items[i] {
            edits.push(
                TextEdit::replace(file.clone(), old_ranges[i], new_items[i].clone())
                    .with_group(group),
            );
        }
    }

    if old_items.len() > new_items.len() {
        let start = if new_items.is_empty() {
            list.start
        } else {
            old_ranges[new_items.len() - 1].end
        };
        let end = if new_items.is_empty() {
            list.end
        } else {
            old_ranges[old_items.len() - 1].end
        };
        edits.push(TextEdit::delete(file.clone(), TextRange::new(start, end)).with_group(group));
    } else if new_items.len() > old_items.len() {
        let appended = new_items[old_items.len()..].join(", ");
        let (offset, text) = if old_items.is_empty() {
            (list.start, appended)
        } else {
            (old_ranges[old_items.len() - 1].end, format!(", {appended}"))
        };
        edits.push(TextEdit::insert(file.clone(), offset, text).with_group(group));
    }

    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParameterChange;
    use recast_core::apply_text_edits;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn vararg_tail_moves_as_a_unit() {
        // foo(int n, String... s) reordered to foo(String... s, int n)
        let params = vec![
            ParameterChange::keep(1, "String...", "s", true),
            ParameterChange::keep(0, "int", "n", false),
        ];
        let new = reshuffle_args(&args(&["1", "\"x\"", "\"y\""]), &params, |_| None);
        assert_eq!(new, args(&["\"x\"", "\"y\"", "1"]));
    }

    #[test]
    fn deleted_vararg_drops_the_tail() {
        let params = vec![
            ParameterChange::keep(0, "int", "n", false),
            ParameterChange::keep(1, "String...", "s", true).delete(),
        ];
        let new = reshuffle_args(&args(&["1", "\"x\"", "\"y\""]), &params, |_| None);
        assert_eq!(new, args(&["1"]));
    }

    #[test]
    fn empty_vararg_default_contributes_nothing() {
        let params = vec![
            ParameterChange::keep(0, "int", "n", false),
            ParameterChange::add("String...", "rest", None),
        ];
        let new = reshuffle_args(&args(&["7"]), &params, |p| p.default_value.clone());
        assert_eq!(new, args(&["7"]));
    }

    #[test]
    fn positional_edits_minimize_churn() {
        let src = "foo(a, b, c)";
        let list = TextRange::new(4, 11);
        let (old_items, old_ranges) = list_items(src, list);
        assert_eq!(old_items, args(&["a", "b", "c"]));

        let file = FileId::new("T.java");
        // delete the middle item
        let edits = positional_list_edits(
            &file,
            list,
            &old_items,
            &old_ranges,
            &args(&["a", "c"]),
            "call-site",
        );
        assert_eq!(apply_text_edits(src, &edits).unwrap(), "foo(a, c)");

        // append one
        let edits = positional_list_edits(
            &file,
            list,
            &old_items,
            &old_ranges,
            &args(&["a", "b", "c", "d"]),
            "call-site",
        );
        assert_eq!(apply_text_edits(src, &edits).unwrap(), "foo(a, b, c, d)");

        // empty the list
        let edits =
            positional_list_edits(&file, list, &old_items, &old_ranges, &[], "call-site");
        assert_eq!(apply_text_edits(src, &edits).unwrap(), "foo()");

        // fill an empty list
        let empty = "foo()";
        let empty_list = TextRange::new(4, 4);
        let edits = positional_list_edits(&file, empty_list, &[], &[], &args(&["x"]), "call-site");
        assert_eq!(apply_text_edits(empty, &edits).unwrap(), "foo(x)");
    }
}
