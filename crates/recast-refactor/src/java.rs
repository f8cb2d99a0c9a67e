//! Small Java text helpers shared across the engine.

/// Strip generics, array suffixes, varargs ellipses, and package qualifiers
/// from a type text: `java.util.Map<K, V>[]...` -> `Map`.
pub(crate) fn erase_type(ty: &str) -> String {
    let ty = ty.trim();
    let ty = ty.split('<').next().unwrap_or(ty);
    let ty = ty.trim_end_matches("...").trim();
    let mut end = ty.len();
    loop {
        let head = ty[..end].trim_end();
        end = head.len();
        if head.ends_with("[]") {
            end -= 2;
        } else {
            break;
        }
    }
    let ty = ty[..end].trim();
    ty.rsplit('.').next().unwrap_or(ty).to_string()
}

/// The simple (unqualified) form of a type text, generics and a trailing
/// varargs ellipsis preserved.
pub(crate) fn simple_type_text(ty: &str) -> String {
    let ty = ty.trim();
    // An ellipsis is not a package separator; peel it before the qualifier
    // split and restore it afterwards.
    let (ty, ellipsis) = match ty.strip_suffix("...") {
        Some(head) => (head.trim_end(), "..."),
        None => (ty, ""),
    };
    let simple = match ty.find('<') {
        Some(open) => {
            let head = &ty[..open];
            let simple_head = head.rsplit('.').next().unwrap_or(head);
            format!("{simple_head}{}", &ty[open..])
        }
        None => ty.rsplit('.').next().unwrap_or(ty).to_string(),
    };
    format!("{simple}{ellipsis}")
}

/// Leading whitespace of the line containing `offset`.
pub(crate) fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &text[line_start..];
    let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_type_strips_decorations() {
        assert_eq!(erase_type("java.util.Map<K, V>"), "Map");
        assert_eq!(erase_type("int[]"), "int");
        assert_eq!(erase_type("String..."), "String");
        assert_eq!(erase_type("List<int[]>"), "List");
    }

    #[test]
    fn simple_type_keeps_generics() {
        assert_eq!(simple_type_text("java.util.List<String>"), "List<String>");
        assert_eq!(simple_type_text("int"), "int");
    }

    #[test]
    fn simple_type_keeps_varargs_ellipsis() {
        assert_eq!(simple_type_text("String..."), "String...");
        assert_eq!(simple_type_text("java.nio.file.Path..."), "Path...");
        assert_eq!(simple_type_text("java.util.List<String>..."), "List<String>...");
    }

    #[test]
    fn indent_of_line() {
        let src = "class A {\n    void f() {}\n}";
        let offset = src.find("void").unwrap();
        assert_eq!(line_indent(src, offset), "    ");
    }
}
