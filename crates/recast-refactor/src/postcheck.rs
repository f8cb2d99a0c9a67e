//! Post-edit sanity check: apply the planned edits in memory, re-sketch the
//! declaring file, and report anything that looks worse than before. Never
//! blocks the refactoring.

use std::collections::BTreeMap;

use recast_core::apply_text_edits;
use recast_index::{Index, Symbol};
use regex::Regex;

use crate::error::SignatureWarning;
use crate::java;
use crate::signature::MethodSignatureChange;

pub(crate) fn verify(
    index: &Index,
    change: &MethodSignatureChange,
    target: &Symbol,
    edit: &recast_core::WorkspaceEdit,
) -> Vec<SignatureWarning> {
    let mut warnings = Vec::new();
    let by_file = edit.edits_by_file();

    let mut rewritten_target = None;
    for (file, edits) in &by_file {
        let Some(text) = index.file_text(file.as_str()) else {
            continue;
        };
        let owned: Vec<_> = edits.iter().map(|e| (*e).clone()).collect();
        let Ok(rewritten) = apply_text_edits(text, &owned) else {
            warnings.push(SignatureWarning::PostEditProblem {
                file: file.as_str().to_string(),
                detail: "planned edits do not apply cleanly".to_string(),
            });
            continue;
        };

        let before = delimiter_problems(text);
        let after = delimiter_problems(&rewritten);
        for problem in after {
            if !before.contains(&problem) {
                warnings.push(SignatureWarning::PostEditProblem {
                    file: file.as_str().to_string(),
                    detail: problem,
                });
            }
        }

        if change.new_return_type.as_deref() == Some("void")
            && change.old_return_type.as_deref() != Some("void")
        {
            check_assignment_contexts(file.as_str(), &rewritten, change, &mut warnings);
        }

        if file.as_str() == target.file {
            rewritten_target = Some(rewritten);
        }
    }

    if let Some(text) = rewritten_target {
        check_declaration_matches(change, target, text, &mut warnings);
    }
    warnings
}

/// Re-sketch the edited declaring file and confirm a declaration carrying
/// the requested name and parameter shape exists.
fn check_declaration_matches(
    change: &MethodSignatureChange,
    target: &Symbol,
    rewritten: String,
    warnings: &mut Vec<SignatureWarning>,
) {
    let file = target.file.clone();
    let mut files = BTreeMap::new();
    files.insert(file.clone(), rewritten);
    let reparsed = Index::new(files);

    let container = target.container.as_deref().unwrap_or_default();
    let wanted_name = if is_constructor_change(change, target) {
        container
    } else {
        change.new_name.as_str()
    };
    let expected: Vec<String> = change
        .retained_parameters()
        .map(|p| java::erase_type(&p.new_type))
        .collect();

    let found = reparsed
        .methods_of(container, wanted_name)
        .into_iter()
        .any(|m| {
            let types: Vec<String> =
                m.param_types.iter().map(|t| java::erase_type(t)).collect();
            types.len() == expected.len()
                && types
                    .iter()
                    .zip(&expected)
                    .all(|(a, b)| a == b || java::simple_type_text(a) == java::simple_type_text(b))
        });
    if !found {
        warnings.push(SignatureWarning::PostEditProblem {
            file,
            detail: format!("edited file has no declaration matching {wanted_name}"),
        });
    }
}

fn is_constructor_change(change: &MethodSignatureChange, target: &Symbol) -> bool {
    target.container.as_deref() == Some(change.old_name.as_str())
}

/// A call whose result feeds an assignment cannot survive a change to a
/// `void` return type.
fn check_assignment_contexts(
    file: &str,
    rewritten: &str,
    change: &MethodSignatureChange,
    warnings: &mut Vec<SignatureWarning>,
) {
    let pattern = format!(r"[=]\s*(?:[\w$.]+\.)?{}\s*\(", regex::escape(&change.new_name));
    let Ok(re) = Regex::new(&pattern) else {
        return;
    };
    if re.is_match(rewritten) {
        warnings.push(SignatureWarning::PostEditProblem {
            file: file.to_string(),
            detail: format!(
                "result of {} is still used in an assignment after the return type became void",
                change.new_name
            ),
        });
    }
}

/// Lexical delimiter balance outside strings, chars, and comments.
fn delimiter_problems(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut paren = 0i64;
    let mut brace = 0i64;
    let mut bracket = 0i64;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' => paren += 1,
            b')' => paren -= 1,
            b'{' => brace += 1,
            b'}' => brace -= 1,
            b'[' => bracket += 1,
            b']' => bracket -= 1,
            _ => {}
        }
        i += 1;
    }

    let mut out = Vec::new();
    if paren != 0 {
        out.push(format!("unbalanced parentheses ({paren:+})"));
    }
    if brace != 0 {
        out.push(format!("unbalanced braces ({brace:+})"));
    }
    if bracket != 0 {
        out.push(format!("unbalanced brackets ({bracket:+})"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_file_reports_nothing() {
        let text = "class A { void f() { int[] a = {1}; } } // )}";
        assert!(delimiter_problems(text).is_empty());
    }

    #[test]
    fn dropped_close_brace_is_reported() {
        let text = "class A { void f() { }";
        let problems = delimiter_problems(text);
        assert_eq!(problems, vec!["unbalanced braces (+1)".to_string()]);
    }
}
