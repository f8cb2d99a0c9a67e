//! Doc comment maintenance for updated declarations: `@param` blocks follow
//! renames, reorders, and deletions; `@return` and `@throws` follow the
//! return type and exception list; new tags are inserted in the canonical
//! tag order.

use crate::signature::{same_exception_type, MethodSignatureChange};

/// Everything needed to rewrite one declaration's doc comment.
pub(crate) struct DocUpdate<'a> {
    pub change: &'a MethodSignatureChange,
    /// The declaration's own parameter names by old index (override family
    /// members may name parameters differently than the target).
    pub old_param_names: Vec<String>,
    pub old_throws: &'a [String],
    pub new_throws: &'a [String],
    /// Only the top of the override family gets newly *added* tags; the
    /// rest only have existing tags moved, renamed, or removed.
    pub add_tags: bool,
    pub return_type_changed_to_void: bool,
    pub return_type_changed_from_void: bool,
}

#[derive(Debug, Clone)]
struct TagBlock {
    tag: String,
    /// First token after the tag (parameter or exception name), if any.
    subject: Option<String>,
    lines: Vec<String>,
}

/// Canonical tag insertion order. Unknown tags sort last and keep their
/// original relative order.
fn tag_priority(tag: &str) -> usize {
    match tag {
        "@author" => 0,
        "@version" => 1,
        "@param" => 2,
        "@return" => 3,
        "@throws" | "@exception" => 4,
        "@see" => 5,
        "@since" => 6,
        _ => 7,
    }
}

/// Rewrite `doc` (a full `/** ... */` text). Returns `None` when nothing
/// changes.
pub(crate) fn rewrite_doc(doc: &str, update: &DocUpdate<'_>) -> Option<String> {
    let lines: Vec<&str> = doc.lines().collect();
    if lines.is_empty() {
        return None;
    }

    let mut header: Vec<String> = Vec::new();
    let mut blocks: Vec<TagBlock> = Vec::new();
    let mut closing: Option<String> = None;

    for (i, raw) in lines.iter().enumerate() {
        let content = stripped_content(raw);
        if i + 1 == lines.len() && content.trim() == "*/" || raw.trim() == "*/" {
            closing = Some(raw.to_string());
            continue;
        }
        if let Some(tag_text) = content.trim_start().strip_prefix('@') {
            let tag = format!(
                "@{}",
                tag_text
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
            );
            let subject = tag_text.split_whitespace().nth(1).map(str::to_string);
            blocks.push(TagBlock {
                tag,
                subject,
                lines: vec![raw.to_string()],
            });
        } else if let Some(block) = blocks.last_mut() {
            block.lines.push(raw.to_string());
        } else {
            header.push(raw.to_string());
        }
    }

    let single_line = lines.len() == 1;
    let prefix = continuation_prefix(&lines);

    let change = update.change;
    let renamed_method = change.is_renamed();

    // Collect the existing param and throws blocks, keep everything else.
    let mut param_blocks: Vec<TagBlock> = Vec::new();
    let mut throws_blocks: Vec<TagBlock> = Vec::new();
    let mut return_block: Option<TagBlock> = None;
    let mut others: Vec<TagBlock> = Vec::new();
    for block in blocks {
        match block.tag.as_str() {
            "@param" => param_blocks.push(block),
            "@throws" | "@exception" => throws_blocks.push(block),
            "@return" => return_block = Some(block),
            _ => others.push(block),
        }
    }

    // New @param sequence in new parameter order.
    let mut new_params: Vec<TagBlock> = Vec::new();
    for param in change.retained_parameters() {
        let old_name = param
            .old_index
            .and_then(|i| update.old_param_names.get(i))
            .cloned();
        match old_name {
            Some(old_name) => {
                let existing = param_blocks
                    .iter()
                    .find(|b| b.subject.as_deref() == Some(old_name.as_str()));
                match existing {
                    Some(block) => {
                        let mut block = block.clone();
                        if old_name != param.new_name {
                            block.lines[0] = rename_subject(
                                &block.lines[0],
                                "@param",
                                &old_name,
                                &param.new_name,
                            );
                            block.subject = Some(param.new_name.clone());
                        }
                        new_params.push(block);
                    }
                    None if update.add_tags => {
                        new_params.push(fresh_tag(&prefix, "@param", &param.new_name));
                    }
                    None => {}
                }
            }
            None if update.add_tags => {
                new_params.push(fresh_tag(&prefix, "@param", &param.new_name));
            }
            None => {}
        }
    }

    // New @throws sequence: kept old blocks in old order, added types after.
    let mut new_throws: Vec<TagBlock> = Vec::new();
    for block in &throws_blocks {
        let Some(subject) = block.subject.as_deref() else {
            continue;
        };
        if update
            .new_throws
            .iter()
            .any(|ty| same_exception_type(ty, subject))
        {
            new_throws.push(block.clone());
        }
    }
    if update.add_tags {
        for ty in update.new_throws {
            let documented = new_throws
                .iter()
                .any(|b| b.subject.as_deref().is_some_and(|s| same_exception_type(s, ty)));
            let was_declared = update
                .old_throws
                .iter()
                .any(|old| same_exception_type(old, ty));
            if !documented && !was_declared {
                let simple = crate::java::simple_type_text(ty);
                new_throws.push(fresh_tag(&prefix, "@throws", &simple));
            }
        }
    }

    // @return follows the new return type.
    let new_return = if update.return_type_changed_to_void {
        None
    } else if update.return_type_changed_from_void && return_block.is_none() && update.add_tags {
        Some(fresh_tag(&prefix, "@return", ""))
    } else {
        return_block
    };

    // Stable merge by tag priority: kept tags hold their relative order,
    // computed groups land at their canonical position.
    let mut merged: Vec<(usize, usize, TagBlock)> = Vec::new();
    for (i, block) in others.into_iter().enumerate() {
        merged.push((tag_priority(&block.tag), i, block));
    }
    let base = merged.len();
    for (i, block) in new_params.into_iter().enumerate() {
        merged.push((tag_priority("@param"), base + i, block));
    }
    if let Some(block) = new_return {
        merged.push((tag_priority("@return"), base + 1000, block));
    }
    for (i, block) in new_throws.into_iter().enumerate() {
        merged.push((tag_priority("@throws"), base + 2000 + i, block));
    }
    merged.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut out_lines: Vec<String> = header;
    for (_, _, block) in &merged {
        out_lines.extend(block.lines.iter().cloned());
    }
    if let Some(closing) = closing {
        out_lines.push(closing);
    }

    let mut out = if single_line && merged.is_empty() {
        lines[0].to_string()
    } else {
        out_lines.join("\n")
    };

    if renamed_method {
        out = rename_doc_references(&out, &change.old_name, &change.new_name);
    }

    if out == doc {
        None
    } else {
        Some(out)
    }
}

fn stripped_content(line: &str) -> &str {
    let trimmed = line.trim_start();
    let trimmed = trimmed.strip_prefix("/**").unwrap_or(trimmed);
    trimmed.strip_prefix('*').unwrap_or(trimmed)
}

/// The `" * "` style prefix used by the doc's continuation lines.
fn continuation_prefix(lines: &[&str]) -> String {
    for line in &lines[1..] {
        let trimmed = line.trim_start();
        if trimmed.starts_with('*') && !trimmed.starts_with("*/") {
            let indent_len = line.len() - trimmed.len();
            return format!("{} * ", &line[..indent_len]);
        }
    }
    " * ".to_string()
}

fn fresh_tag(prefix: &str, tag: &str, subject: &str) -> TagBlock {
    let line = if subject.is_empty() {
        format!("{prefix}{tag}")
    } else {
        format!("{prefix}{tag} {subject}")
    };
    TagBlock {
        tag: tag.to_string(),
        subject: if subject.is_empty() {
            None
        } else {
            Some(subject.to_string())
        },
        lines: vec![line],
    }
}

fn rename_subject(line: &str, tag: &str, old: &str, new: &str) -> String {
    let Some(tag_at) = line.find(tag) else {
        return line.to_string();
    };
    let rest_at = tag_at + tag.len();
    let rest = &line[rest_at..];
    let name_at = rest.len() - rest.trim_start().len();
    let after_name = &rest[name_at..];
    if after_name.starts_with(old)
        && after_name[old.len()..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true)
    {
        format!(
            "{}{}{}{}",
            &line[..rest_at],
            &rest[..name_at],
            new,
            &after_name[old.len()..]
        )
    } else {
        line.to_string()
    }
}

/// Rename `#old(`/`#old}`-style member references inside a doc text.
pub(crate) fn rename_doc_references(doc: &str, old: &str, new: &str) -> String {
    let needle = format!("#{old}");
    let mut out = String::with_capacity(doc.len());
    let mut rest = doc;
    while let Some(at) = rest.find(&needle) {
        let after = &rest[at + needle.len()..];
        let boundary = after
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true);
        out.push_str(&rest[..at]);
        if boundary {
            out.push('#');
            out.push_str(new);
        } else {
            out.push_str(&rest[at..at + needle.len()]);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{MethodId, ParameterChange, ValidationState};
    use recast_index::Visibility;

    fn base_change(params: Vec<ParameterChange>) -> MethodSignatureChange {
        MethodSignatureChange {
            target: MethodId(0),
            old_name: "run".into(),
            new_name: "run".into(),
            old_return_type: Some("void".into()),
            new_return_type: Some("void".into()),
            old_visibility: Visibility::Public,
            new_visibility: Visibility::Public,
            parameters: params,
            exceptions: Vec::new(),
            delegate: false,
            deprecate_delegate: false,
            state: ValidationState::Unchecked,
        }
    }

    #[test]
    fn params_follow_reorder_rename_and_delete() {
        let doc = "/**\n * Runs the job.\n *\n * @param count how many\n * @param label the label\n * @return nothing\n */";
        let change = base_change(vec![
            ParameterChange::keep(1, "String", "label", false).renamed("name"),
            ParameterChange::keep(0, "int", "count", false).delete(),
        ]);
        let update = DocUpdate {
            change: &change,
            old_param_names: vec!["count".into(), "label".into()],
            old_throws: &[],
            new_throws: &[],
            add_tags: true,
            return_type_changed_to_void: false,
            return_type_changed_from_void: false,
        };
        let out = rewrite_doc(doc, &update).unwrap();
        assert!(out.contains("@param name the label"));
        assert!(!out.contains("@param count"));
        assert!(out.contains("@return nothing"));
        let param_at = out.find("@param").unwrap();
        let return_at = out.find("@return").unwrap();
        assert!(param_at < return_at);
    }

    #[test]
    fn added_tags_only_at_family_top() {
        let doc = "/**\n * Doc.\n * @param a first\n */";
        let change = base_change(vec![
            ParameterChange::keep(0, "int", "a", false),
            ParameterChange::add("String", "b", Some("\"\"")),
        ]);
        let mk = |add_tags| DocUpdate {
            change: &change,
            old_param_names: vec!["a".into()],
            old_throws: &[],
            new_throws: &[],
            add_tags,
            return_type_changed_to_void: false,
            return_type_changed_from_void: false,
        };
        let top = rewrite_doc(doc, &mk(true)).unwrap();
        assert!(top.contains("@param b"));
        assert!(rewrite_doc(doc, &mk(false)).is_none());
    }

    #[test]
    fn throws_tags_follow_exception_list() {
        let doc = "/**\n * Doc.\n * @exception IOException boom\n * @see Other\n */";
        let change = base_change(Vec::new());
        let old_throws = vec!["IOException".to_string()];
        let new_throws = vec!["java.sql.SQLException".to_string()];
        let update = DocUpdate {
            change: &change,
            old_param_names: Vec::new(),
            old_throws: &old_throws,
            new_throws: &new_throws,
            add_tags: true,
            return_type_changed_to_void: false,
            return_type_changed_from_void: false,
        };
        let out = rewrite_doc(doc, &update).unwrap();
        assert!(!out.contains("@exception IOException"));
        assert!(out.contains("@throws SQLException"));
        let throws_at = out.find("@throws").unwrap();
        let see_at = out.find("@see").unwrap();
        assert!(throws_at < see_at);
    }

    #[test]
    fn doc_reference_rename_respects_word_boundaries() {
        let doc = "/** See {@link Foo#run(int)} and #runner. */";
        let out = rename_doc_references(doc, "run", "exec");
        assert_eq!(out, "/** See {@link Foo#exec(int)} and #runner. */");
    }
}
