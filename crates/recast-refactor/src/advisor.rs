//! Pluggable synthesis of call-site arguments for added parameters.

use recast_index::Symbol;

use crate::signature::ParameterChange;

/// Everything an advisor can look at when asked for a value.
pub struct AdvisorContext<'a> {
    /// Argument texts at the call site being rewritten, in old order.
    pub call_args: &'a [String],
    /// The full ordered parameter plan.
    pub parameters: &'a [ParameterChange],
    /// The method enclosing the call site, when known.
    pub enclosing_method: Option<&'a Symbol>,
    /// True when the call is a recursive self-call inside a method of the
    /// override family; such sites can often just forward the new parameter.
    pub is_recursive: bool,
    pub file: &'a str,
}

/// Supplies argument expressions for added parameters at updated call sites.
///
/// Absence of an advisor, or `None` from one, falls back to a literal
/// placeholder derived from the parameter type.
pub trait DefaultValueAdvisor {
    fn default_value(&self, added: &ParameterChange, cx: &AdvisorContext<'_>) -> Option<String>;

    /// A concrete type text to use where the requested one cannot be
    /// resolved. `None` keeps the requested text.
    fn synthesized_type(&self, _ty: &str, _cx: &AdvisorContext<'_>) -> Option<String> {
        None
    }
}

/// The zero-guess placeholder for a Java type.
pub(crate) fn placeholder_value(ty: &str) -> String {
    let base = ty.trim().trim_end_matches("...").trim();
    match base {
        "byte" | "short" | "int" | "long" => "0".to_string(),
        "float" => "0.0f".to_string(),
        "double" => "0.0".to_string(),
        "char" => "' '".to_string(),
        "boolean" => "false".to_string(),
        "String" | "java.lang.String" => "\"\"".to_string(),
        _ => "null".to_string(),
    }
}

/// The value an added parameter contributes at a call site: the explicit
/// default, then the advisor, then the placeholder. An added vararg with no
/// default or advisor value contributes nothing.
pub(crate) fn value_for_added(
    added: &ParameterChange,
    advisor: Option<&dyn DefaultValueAdvisor>,
    cx: &AdvisorContext<'_>,
) -> Option<String> {
    if let Some(value) = &added.default_value {
        if value.trim().is_empty() {
            return if added.is_new_varargs {
                None
            } else {
                Some(placeholder_value(&added.new_type))
            };
        }
        return Some(value.clone());
    }
    if let Some(advisor) = advisor {
        if let Some(value) = advisor.default_value(added, cx) {
            return Some(value);
        }
    }
    if added.is_new_varargs {
        None
    } else {
        Some(placeholder_value(&added.new_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_track_the_type() {
        assert_eq!(placeholder_value("int"), "0");
        assert_eq!(placeholder_value("boolean"), "false");
        assert_eq!(placeholder_value("java.util.List<String>"), "null");
        assert_eq!(placeholder_value("double"), "0.0");
    }
}
