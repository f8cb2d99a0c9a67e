//! A small lexical "parser" that sketches just enough Java structure for the
//! refactoring engine: types, members with parameter/throws sub-ranges,
//! imports, and attached doc comments.
//!
//! Like the rest of this crate it is deliberately best-effort: malformed
//! code degrades to fewer symbols, never to a panic.

use recast_core::TextRange;

use crate::scan::{
    find_matching_brace, find_matching_paren, is_ident_continue, is_ident_start, skip_char,
    skip_string, split_top_level_ranges,
};
use crate::symbols::{ImportDecl, MethodDetails, ParamSketch, TypeKind, Visibility};

#[derive(Debug, Default)]
pub(crate) struct ParsedFile {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<ParsedType>,
}

#[derive(Debug)]
pub(crate) struct ParsedType {
    pub kind: TypeKind,
    pub name: String,
    pub name_range: TextRange,
    pub decl_range: TextRange,
    pub body_range: Option<TextRange>,
    pub doc_range: Option<TextRange>,
    pub visibility: Visibility,
    pub container: Option<String>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub extends_interfaces: Vec<String>,
    pub type_params: Vec<String>,
    pub methods: Vec<ParsedMethodDecl>,
    pub fields: Vec<ParsedFieldDecl>,
    pub enum_constants: Vec<ParsedEnumConstant>,
}

#[derive(Debug)]
pub(crate) struct ParsedMethodDecl {
    pub name: String,
    pub name_range: TextRange,
    pub decl_range: TextRange,
    pub doc_range: Option<TextRange>,
    pub body_range: Option<TextRange>,
    pub visibility: Visibility,
    pub is_override: bool,
    pub details: MethodDetails,
}

#[derive(Debug)]
pub(crate) struct ParsedFieldDecl {
    pub name: String,
    pub name_range: TextRange,
    pub decl_range: TextRange,
    pub visibility: Visibility,
}

#[derive(Debug)]
pub(crate) struct ParsedEnumConstant {
    pub name: String,
    pub name_range: TextRange,
    pub decl_range: TextRange,
}

/// Strip package qualifiers, generic arguments, varargs ellipses, and array
/// suffixes from a type string: `foo.Bar<Baz>[]...` -> `Bar`.
pub(crate) fn strip_simple_name(ty: &str) -> String {
    let ty = ty.trim();
    let ty = ty.split('<').next().unwrap_or(ty);
    let ty = ty.trim_end_matches("...").trim();
    let ty = ty.trim_end();
    let mut end = ty.len();
    while end >= 2 && ty[..end].ends_with("[]") {
        end -= 2;
        while end > 0 && ty.as_bytes()[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
    }
    let ty = &ty[..end];
    ty.rsplit('.').next().unwrap_or(ty).trim().to_string()
}

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "strictfp",
    "default",
    "transient",
    "volatile",
];

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    cursor: usize,
    limit: usize,
    /// Doc comment immediately preceding the current position, if any.
    pending_doc: Option<TextRange>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, start: usize, limit: usize) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            cursor: start,
            limit,
            pending_doc: None,
        }
    }

    fn at_end(&self) -> bool {
        self.cursor >= self.limit
    }

    fn peek(&self) -> Option<u8> {
        if self.cursor < self.limit {
            Some(self.bytes[self.cursor])
        } else {
            None
        }
    }

    /// Skip whitespace and comments, remembering the most recent doc comment
    /// so it can be attached to the next declaration.
    fn skip_trivia(&mut self) {
        loop {
            while self.cursor < self.limit && self.bytes[self.cursor].is_ascii_whitespace() {
                self.cursor += 1;
            }
            if self.cursor + 1 < self.limit && self.bytes[self.cursor] == b'/' {
                if self.bytes[self.cursor + 1] == b'/' {
                    while self.cursor < self.limit && self.bytes[self.cursor] != b'\n' {
                        self.cursor += 1;
                    }
                    continue;
                }
                if self.bytes[self.cursor + 1] == b'*' {
                    let start = self.cursor;
                    let is_doc =
                        self.cursor + 2 < self.limit && self.bytes[self.cursor + 2] == b'*';
                    self.cursor += 2;
                    while self.cursor + 1 < self.limit
                        && !(self.bytes[self.cursor] == b'*' && self.bytes[self.cursor + 1] == b'/')
                    {
                        self.cursor += 1;
                    }
                    self.cursor = (self.cursor + 2).min(self.limit);
                    if is_doc {
                        self.pending_doc = Some(TextRange::new(start, self.cursor));
                    }
                    continue;
                }
            }
            break;
        }
    }

    fn take_doc(&mut self) -> Option<TextRange> {
        self.pending_doc.take()
    }

    /// Read the identifier at the cursor, if any. Does not skip trivia.
    fn read_ident(&mut self) -> Option<(&'a str, TextRange)> {
        if self.cursor >= self.limit || !is_ident_start(self.bytes[self.cursor]) {
            return None;
        }
        let start = self.cursor;
        self.cursor += 1;
        while self.cursor < self.limit && is_ident_continue(self.bytes[self.cursor]) {
            self.cursor += 1;
        }
        Some((
            &self.text[start..self.cursor],
            TextRange::new(start, self.cursor),
        ))
    }

    /// Skip a balanced `<...>` starting at the cursor. Angle brackets inside
    /// declaration headers never contain strings, so plain depth counting is
    /// enough.
    fn skip_angles(&mut self) -> TextRange {
        let start = self.cursor;
        let mut depth = 0i32;
        while self.cursor < self.limit {
            match self.bytes[self.cursor] {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        self.cursor += 1;
                        break;
                    }
                }
                _ => {}
            }
            self.cursor += 1;
        }
        TextRange::new(start, self.cursor)
    }

    /// Advance past a top-level `;`, tracking braces so array initializers
    /// and anonymous classes in field initializers don't end the statement.
    fn skip_to_statement_end(&mut self) {
        let mut depth = 0i32;
        while self.cursor < self.limit {
            let b = self.bytes[self.cursor];
            if b == b'"' {
                self.cursor = skip_string(self.bytes, self.cursor).min(self.limit);
                continue;
            }
            if b == b'\'' {
                self.cursor = skip_char(self.bytes, self.cursor).min(self.limit);
                continue;
            }
            match b {
                b'{' | b'(' | b'[' => depth += 1,
                b'}' | b')' | b']' => depth -= 1,
                b';' if depth <= 0 => {
                    self.cursor += 1;
                    return;
                }
                _ => {}
            }
            self.cursor += 1;
        }
    }
}

pub(crate) fn parse_file(file: &str, text: &str) -> ParsedFile {
    let mut out = ParsedFile::default();
    let mut scanner = Scanner::new(text, 0, text.len());

    loop {
        scanner.skip_trivia();
        if scanner.at_end() {
            break;
        }
        let decl_start = scanner.cursor;
        let doc = scanner.take_doc();

        match scanner.peek() {
            Some(b'@') => {
                // `@interface Foo` or a type-level annotation; both are
                // handled by the declaration parser.
                if let Some(ty) = parse_type_decl(&mut scanner, decl_start, doc, None, &mut out) {
                    out.types.push(ty);
                } else {
                    scanner.cursor += 1;
                }
            }
            Some(b) if is_ident_start(b) => {
                let saved = scanner.cursor;
                let (word, _) = scanner.read_ident().unwrap_or(("", TextRange::empty(saved)));
                match word {
                    "package" => {
                        let start = scanner.cursor;
                        scanner.skip_to_statement_end();
                        let end = scanner.cursor.saturating_sub(1).max(start);
                        out.package = Some(text[start..end].trim().to_string());
                    }
                    "import" => {
                        parse_import(&mut scanner, file, saved, &mut out.imports);
                    }
                    _ => {
                        scanner.cursor = saved;
                        if let Some(ty) =
                            parse_type_decl(&mut scanner, decl_start, doc, None, &mut out)
                        {
                            out.types.push(ty);
                        } else {
                            // Unrecognized top-level token; move on.
                            scanner.cursor = saved + word.len().max(1);
                        }
                    }
                }
            }
            _ => {
                scanner.cursor += 1;
            }
        }
    }

    out
}

fn parse_import(scanner: &mut Scanner<'_>, file: &str, kw_start: usize, out: &mut Vec<ImportDecl>) {
    let text = scanner.text;
    scanner.skip_trivia();
    let mut is_static = false;
    let saved = scanner.cursor;
    if let Some((word, _)) = scanner.read_ident() {
        if word == "static" {
            is_static = true;
        } else {
            scanner.cursor = saved;
        }
    }
    scanner.skip_trivia();
    let path_start = scanner.cursor;
    scanner.skip_to_statement_end();
    let stmt_end = scanner.cursor;
    let path_end = stmt_end.saturating_sub(1).max(path_start);
    let raw = text[path_start..path_end].trim();
    if raw.is_empty() {
        return;
    }

    let is_on_demand = raw.ends_with(".*") || raw == "*";
    let path = raw.trim_end_matches(".*").replace(char::is_whitespace, "");
    let simple_name = if is_on_demand {
        "*".to_string()
    } else {
        path.rsplit('.').next().unwrap_or(&path).to_string()
    };

    // Range of the final segment, for rename edits on static imports.
    let name_range = if is_on_demand {
        TextRange::new(path_end, path_end)
    } else {
        let rel = text[path_start..path_end]
            .rfind(simple_name.as_str())
            .unwrap_or(0);
        TextRange::new(path_start + rel, path_start + rel + simple_name.len())
    };

    // Swallow one trailing newline so removing the import removes its line.
    let mut range_end = stmt_end;
    let bytes = text.as_bytes();
    if bytes.get(range_end) == Some(&b'\n') {
        range_end += 1;
    } else if bytes.get(range_end) == Some(&b'\r') && bytes.get(range_end + 1) == Some(&b'\n') {
        range_end += 2;
    }

    out.push(ImportDecl {
        file: file.to_string(),
        range: TextRange::new(kw_start, range_end),
        path,
        simple_name,
        name_range,
        is_static,
        is_on_demand,
    });
}

/// Parse one type declaration (annotations/modifiers/kind keyword onwards).
/// Returns `None` if the cursor is not actually at a type declaration.
fn parse_type_decl(
    scanner: &mut Scanner<'_>,
    decl_start: usize,
    doc: Option<TextRange>,
    container: Option<&str>,
    sink: &mut ParsedFile,
) -> Option<ParsedType> {
    let text = scanner.text;
    let mut visibility = Visibility::PackagePrivate;

    let kind = loop {
        scanner.skip_trivia();
        match scanner.peek()? {
            b'@' => {
                scanner.cursor += 1;
                let (word, _) = scanner.read_ident()?;
                if word == "interface" {
                    break TypeKind::Annotation;
                }
                // Plain annotation; skip an argument list if present.
                scanner.skip_trivia();
                if scanner.peek() == Some(b'(') {
                    scanner.cursor =
                        find_matching_paren(text, scanner.cursor).unwrap_or(scanner.limit);
                }
            }
            b if is_ident_start(b) => {
                let (word, _) = scanner.read_ident()?;
                match word {
                    "class" => break TypeKind::Class,
                    "interface" => break TypeKind::Interface,
                    "enum" => break TypeKind::Enum,
                    "record" => break TypeKind::Record,
                    _ if MODIFIERS.contains(&word) => {
                        if let Some(v) = Visibility::from_keyword(word) {
                            visibility = v;
                        }
                    }
                    _ => return None,
                }
            }
            _ => return None,
        }
    };

    scanner.skip_trivia();
    let (name, name_range) = scanner.read_ident().map(|(n, r)| (n.to_string(), r))?;

    scanner.skip_trivia();
    let mut type_params = Vec::new();
    if scanner.peek() == Some(b'<') {
        let range = scanner.skip_angles();
        type_params = parse_type_param_names(&text[range.start..range.end]);
    }

    // Record header: `record R(int x, int y)`.
    if kind == TypeKind::Record {
        scanner.skip_trivia();
        if scanner.peek() == Some(b'(') {
            scanner.cursor = find_matching_paren(text, scanner.cursor).unwrap_or(scanner.limit);
        }
    }

    let mut extends = None;
    let mut implements = Vec::new();
    let mut extends_interfaces = Vec::new();

    loop {
        scanner.skip_trivia();
        let saved = scanner.cursor;
        let Some((word, _)) = scanner.read_ident() else {
            break;
        };
        match word {
            "extends" => {
                let names = parse_type_name_list(scanner);
                if kind == TypeKind::Interface {
                    extends_interfaces = names;
                } else {
                    extends = names.into_iter().next();
                }
            }
            "implements" => {
                implements = parse_type_name_list(scanner);
            }
            "permits" => {
                let _ = parse_type_name_list(scanner);
            }
            _ => {
                scanner.cursor = saved;
                break;
            }
        }
    }

    scanner.skip_trivia();
    if scanner.peek() != Some(b'{') {
        return None;
    }
    let body_open = scanner.cursor;
    let after_close = find_matching_brace(text, body_open)?;
    let body_range = TextRange::new(body_open + 1, after_close - 1);
    scanner.cursor = after_close;

    let mut ty = ParsedType {
        kind,
        name,
        name_range,
        decl_range: TextRange::new(decl_start, after_close),
        body_range: Some(body_range),
        doc_range: doc,
        visibility,
        container: container.map(str::to_string),
        extends,
        implements,
        extends_interfaces,
        type_params,
        methods: Vec::new(),
        fields: Vec::new(),
        enum_constants: Vec::new(),
    };

    parse_members(text, body_range, &mut ty, sink);
    Some(ty)
}

fn parse_type_param_names(angles: &str) -> Vec<String> {
    let inner = angles.trim_start_matches('<').trim_end_matches('>');
    inner
        .split(',')
        .filter_map(|p| {
            p.trim()
                .split(|c: char| c.is_ascii_whitespace())
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Parse a comma-separated type name list in a declaration header, stopping
/// before `{`, `extends`, `implements`, or `permits`.
fn parse_type_name_list(scanner: &mut Scanner<'_>) -> Vec<String> {
    let text = scanner.text;
    let start = scanner.cursor;
    let mut angle_depth = 0i32;
    while scanner.cursor < scanner.limit {
        let b = scanner.bytes[scanner.cursor];
        match b {
            b'<' => angle_depth += 1,
            b'>' => angle_depth -= 1,
            b'{' | b'(' if angle_depth == 0 => break,
            _ if angle_depth == 0 && is_ident_start(b) => {
                let saved = scanner.cursor;
                let (word, _) = scanner.read_ident().unwrap_or(("", TextRange::empty(saved)));
                if matches!(word, "extends" | "implements" | "permits") {
                    scanner.cursor = saved;
                    break;
                }
                continue;
            }
            _ => {}
        }
        scanner.cursor += 1;
    }
    text[start..scanner.cursor]
        .split(',')
        .map(strip_simple_name)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_members(text: &str, body: TextRange, ty: &mut ParsedType, sink: &mut ParsedFile) {
    let mut scanner = Scanner::new(text, body.start, body.end);

    if ty.kind == TypeKind::Enum {
        parse_enum_constants(&mut scanner, ty);
    }

    loop {
        scanner.skip_trivia();
        if scanner.at_end() {
            break;
        }
        let decl_start = scanner.cursor;
        let doc = scanner.take_doc();

        if scanner.peek() == Some(b';') {
            scanner.cursor += 1;
            continue;
        }
        if scanner.peek() == Some(b'}') {
            // Defensive: a brace mismatch upstream. Stop rather than loop.
            break;
        }

        parse_member(&mut scanner, decl_start, doc, ty, sink);
        if scanner.cursor == decl_start {
            // Whatever this was, it didn't parse; make progress anyway.
            scanner.cursor += 1;
        }
    }
}

fn parse_enum_constants(scanner: &mut Scanner<'_>, ty: &mut ParsedType) {
    let text = scanner.text;
    // Constants run until the first top-level `;` (or the end of the body).
    let start = scanner.cursor;
    let mut depth = 0i32;
    let mut end = scanner.limit;
    let mut i = start;
    let bytes = scanner.bytes;
    while i < scanner.limit {
        let b = bytes[i];
        if b == b'"' {
            i = skip_string(bytes, i).min(scanner.limit);
            continue;
        }
        if b == b'\'' {
            i = skip_char(bytes, i).min(scanner.limit);
            continue;
        }
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            b';' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
        i += 1;
    }

    for piece in split_top_level_ranges(&text[start..end], ',') {
        let piece_start = start + piece.start;
        let piece_text = &text[piece_start..start + piece.end];
        let mut inner = Scanner::new(text, piece_start, piece_start + piece_text.len());
        inner.skip_trivia();
        if let Some((name, name_range)) = inner.read_ident() {
            ty.enum_constants.push(ParsedEnumConstant {
                name: name.to_string(),
                name_range,
                decl_range: TextRange::new(piece_start, start + piece.end),
            });
        }
    }

    scanner.cursor = if end < scanner.limit { end + 1 } else { end };
}

fn parse_member(
    scanner: &mut Scanner<'_>,
    decl_start: usize,
    doc: Option<TextRange>,
    ty: &mut ParsedType,
    sink: &mut ParsedFile,
) {
    let text = scanner.text;
    let mut visibility = Visibility::PackagePrivate;
    let mut visibility_range: Option<TextRange> = None;
    let mut is_override = false;
    let mut is_static = false;
    let mut is_native = false;
    let mut is_abstract = false;
    let mut modifier_insert_offset: Option<usize> = None;
    let mut type_params: Vec<String> = Vec::new();
    let mut last_token: Option<(String, TextRange)> = None;
    let mut return_start: Option<usize> = None;

    loop {
        scanner.skip_trivia();
        let Some(b) = scanner.peek() else {
            return;
        };
        match b {
            b'@' => {
                let at = scanner.cursor;
                scanner.cursor += 1;
                let Some((word, _)) = scanner.read_ident() else {
                    return;
                };
                if word == "interface" {
                    // Nested annotation type: rewind and parse as a type.
                    scanner.cursor = at;
                    if let Some(nested) =
                        parse_type_decl(scanner, decl_start, doc, Some(&ty.name), sink)
                    {
                        sink.types.push(nested);
                    }
                    return;
                }
                if word == "Override" {
                    is_override = true;
                }
                scanner.skip_trivia();
                if scanner.peek() == Some(b'(') {
                    scanner.cursor =
                        find_matching_paren(text, scanner.cursor).unwrap_or(scanner.limit);
                }
            }
            b'<' => {
                let range = scanner.skip_angles();
                if let Some((tok, tok_range)) = last_token.take() {
                    // Generic arguments on the return type, not method type
                    // parameters.
                    last_token = Some((tok, TextRange::new(tok_range.start, range.end)));
                } else {
                    type_params = parse_type_param_names(&text[range.start..range.end]);
                    return_start = Some(scanner.cursor);
                }
            }
            b'[' => {
                // Array suffix on the previous type token; fold into it.
                scanner.cursor += 1;
                while scanner.cursor < scanner.limit && scanner.bytes[scanner.cursor] != b']' {
                    scanner.cursor += 1;
                }
                scanner.cursor = (scanner.cursor + 1).min(scanner.limit);
                if let Some((tok, range)) = last_token.take() {
                    last_token = Some((
                        format!("{tok}[]"),
                        TextRange::new(range.start, scanner.cursor),
                    ));
                }
            }
            b'(' => {
                let Some((name, name_range)) = last_token else {
                    return;
                };
                if let Some(method) = parse_method_tail(
                    scanner,
                    MethodHeader {
                        decl_start,
                        doc,
                        visibility,
                        visibility_range,
                        modifier_insert_offset: modifier_insert_offset.unwrap_or(decl_start),
                        is_override,
                        is_static,
                        is_native,
                        is_abstract,
                        type_params,
                        return_start,
                        name,
                        name_range,
                        type_name: &ty.name,
                    },
                ) {
                    ty.methods.push(method);
                }
                return;
            }
            b'=' | b';' | b',' => {
                let end_at_eq = b == b'=' || b == b',';
                if end_at_eq {
                    scanner.skip_to_statement_end();
                } else {
                    scanner.cursor += 1;
                }
                if let Some((name, name_range)) = last_token {
                    ty.fields.push(ParsedFieldDecl {
                        name,
                        name_range,
                        decl_range: TextRange::new(decl_start, scanner.cursor),
                        visibility,
                    });
                }
                return;
            }
            b'{' => {
                // Static or instance initializer block.
                scanner.cursor = find_matching_brace(text, scanner.cursor).unwrap_or(scanner.limit);
                return;
            }
            b'}' => {
                scanner.cursor += 1;
                return;
            }
            _ if is_ident_start(b) => {
                let saved = scanner.cursor;
                let Some((word, range)) = scanner.read_ident() else {
                    return;
                };
                if matches!(word, "class" | "interface" | "enum" | "record") {
                    scanner.cursor = saved;
                    if let Some(nested) =
                        parse_type_decl(scanner, decl_start, doc, Some(&ty.name), sink)
                    {
                        sink.types.push(nested);
                    }
                    return;
                }
                if MODIFIERS.contains(&word) {
                    if modifier_insert_offset.is_none() {
                        modifier_insert_offset = Some(range.start);
                    }
                    match word {
                        "static" => is_static = true,
                        "native" => is_native = true,
                        "abstract" => is_abstract = true,
                        _ => {
                            if let Some(v) = Visibility::from_keyword(word) {
                                visibility = v;
                                visibility_range = Some(range);
                            }
                        }
                    }
                    return_start = Some(scanner.cursor);
                } else {
                    if modifier_insert_offset.is_none() {
                        modifier_insert_offset = Some(range.start);
                    }
                    if return_start.is_none() {
                        return_start = Some(range.start);
                    }
                    // Earlier non-modifier tokens belong to the return type;
                    // only the last one can be the member name.
                    last_token = Some((word.to_string(), range));
                }
            }
            _ => {
                scanner.cursor += 1;
                return;
            }
        }
    }
}

struct MethodHeader<'a> {
    decl_start: usize,
    doc: Option<TextRange>,
    visibility: Visibility,
    visibility_range: Option<TextRange>,
    modifier_insert_offset: usize,
    is_override: bool,
    is_static: bool,
    is_native: bool,
    is_abstract: bool,
    type_params: Vec<String>,
    return_start: Option<usize>,
    name: String,
    name_range: TextRange,
    type_name: &'a str,
}

fn parse_method_tail(
    scanner: &mut Scanner<'_>,
    header: MethodHeader<'_>,
) -> Option<ParsedMethodDecl> {
    let text = scanner.text;
    let open = scanner.cursor;
    let after_close = find_matching_paren(text, open)?;
    let params_range = TextRange::new(open + 1, after_close - 1);
    let params = parse_params(text, params_range);
    scanner.cursor = after_close;

    // Old-style extra return dims: `int foo()[]`. The throws insertion
    // point stays glued to the close paren or the last bracket.
    let mut extra_dims = 0u8;
    let mut throws_insert_offset = scanner.cursor;
    loop {
        scanner.skip_trivia();
        if scanner.peek() == Some(b'[') {
            scanner.cursor += 1;
            while scanner.cursor < scanner.limit && scanner.bytes[scanner.cursor] != b']' {
                scanner.cursor += 1;
            }
            scanner.cursor = (scanner.cursor + 1).min(scanner.limit);
            extra_dims += 1;
            throws_insert_offset = scanner.cursor;
        } else {
            break;
        }
    }
    let mut throws = Vec::new();
    let mut throws_range = None;
    scanner.skip_trivia();
    let saved = scanner.cursor;
    if let Some((word, kw_range)) = scanner.read_ident() {
        if word == "throws" {
            scanner.skip_trivia();
            let list_start = scanner.cursor;
            let mut angle_depth = 0i32;
            while scanner.cursor < scanner.limit {
                match scanner.bytes[scanner.cursor] {
                    b'<' => angle_depth += 1,
                    b'>' => angle_depth -= 1,
                    b'{' | b';' if angle_depth == 0 => break,
                    _ => {}
                }
                scanner.cursor += 1;
            }
            let raw = &text[list_start..scanner.cursor];
            let trimmed_len = raw.trim_end().len();
            throws = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            throws_range = Some(TextRange::new(kw_range.start, list_start + trimmed_len));
        } else {
            scanner.cursor = saved;
        }
    }

    scanner.skip_trivia();
    let (decl_end, body_range) = match scanner.peek() {
        Some(b'{') => {
            let after = find_matching_brace(text, scanner.cursor)?;
            let body = TextRange::new(scanner.cursor + 1, after - 1);
            scanner.cursor = after;
            (after, Some(body))
        }
        Some(b';') => {
            scanner.cursor += 1;
            (scanner.cursor, None)
        }
        _ => return None,
    };

    let name_range = header.name_range;
    let is_constructor = header.name == header.type_name && {
        // A constructor has no return-type tokens between the modifiers and
        // the name.
        let span = &text[header.return_start.unwrap_or(name_range.start)..name_range.start];
        span.trim().is_empty()
    };

    let (return_type, return_type_range) = if is_constructor {
        (None, None)
    } else {
        let start = header.return_start.unwrap_or(name_range.start);
        let raw = &text[start..name_range.start];
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            (None, None)
        } else {
            (
                Some(trimmed.to_string()),
                Some(TextRange::new(
                    start + leading,
                    start + leading + trimmed.len(),
                )),
            )
        }
    };

    let is_varargs = params.last().is_some_and(|p| p.is_varargs);
    let details = MethodDetails {
        params,
        params_range,
        return_type,
        return_type_range,
        throws,
        throws_range,
        throws_insert_offset,
        visibility_range: header.visibility_range,
        modifier_insert_offset: header.modifier_insert_offset,
        type_params: header.type_params,
        extra_dims,
        is_constructor,
        is_static: header.is_static,
        is_native: header.is_native,
        is_abstract: header.is_abstract,
        is_varargs,
    };

    Some(ParsedMethodDecl {
        name: header.name,
        name_range,
        decl_range: TextRange::new(header.decl_start, decl_end),
        doc_range: header.doc,
        body_range,
        visibility: header.visibility,
        is_override: header.is_override,
        details,
    })
}

pub(crate) fn parse_params(text: &str, params_range: TextRange) -> Vec<ParamSketch> {
    let src = &text[params_range.start..params_range.end];
    if src.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for piece in split_top_level_ranges(src, ',') {
        let abs_start = params_range.start + piece.start;
        let abs_end = params_range.start + piece.end;
        let raw = &text[abs_start..abs_end];
        if raw.trim().is_empty() {
            continue;
        }
        if let Some(param) = parse_one_param(text, abs_start, abs_end) {
            out.push(param);
        }
    }
    out
}

fn parse_one_param(text: &str, start: usize, end: usize) -> Option<ParamSketch> {
    let bytes = text.as_bytes();
    let mut cursor = start;

    // Skip leading whitespace, `final`, and annotations.
    loop {
        while cursor < end && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if cursor < end && bytes[cursor] == b'@' {
            cursor += 1;
            while cursor < end && is_ident_continue(bytes[cursor]) {
                cursor += 1;
            }
            if cursor < end && bytes[cursor] == b'(' {
                cursor = find_matching_paren(text, cursor).unwrap_or(end).min(end);
            }
            continue;
        }
        if text[cursor..end].starts_with("final")
            && !is_ident_continue(*bytes.get(cursor + 5).unwrap_or(&b' '))
        {
            cursor += 5;
            continue;
        }
        break;
    }
    if cursor >= end {
        return None;
    }
    let decl_start = cursor;

    // The parameter name is the last identifier before any trailing `[]`s.
    let mut scan_end = end;
    while scan_end > decl_start && bytes[scan_end - 1].is_ascii_whitespace() {
        scan_end -= 1;
    }
    let mut extra_dims = 0u8;
    loop {
        while scan_end > decl_start && bytes[scan_end - 1].is_ascii_whitespace() {
            scan_end -= 1;
        }
        if scan_end >= decl_start + 2 && bytes[scan_end - 1] == b']' {
            let mut j = scan_end - 1;
            while j > decl_start && bytes[j - 1].is_ascii_whitespace() {
                j -= 1;
            }
            if j > decl_start && bytes[j - 1] == b'[' {
                scan_end = j - 1;
                extra_dims += 1;
                continue;
            }
        }
        break;
    }
    let name_end = scan_end;
    let mut name_start = name_end;
    while name_start > decl_start && is_ident_continue(bytes[name_start - 1]) {
        name_start -= 1;
    }
    if name_start == name_end {
        return None;
    }

    let mut type_end = name_start;
    while type_end > decl_start && bytes[type_end - 1].is_ascii_whitespace() {
        type_end -= 1;
    }
    if type_end == decl_start {
        return None;
    }

    let ty = text[decl_start..type_end].trim().to_string();
    let is_varargs = ty.ends_with("...");

    let mut range_end = end;
    while range_end > decl_start && bytes[range_end - 1].is_ascii_whitespace() {
        range_end -= 1;
    }

    Some(ParamSketch {
        ty,
        name: text[name_start..name_end].to_string(),
        is_varargs,
        range: TextRange::new(decl_start, range_end),
        type_range: TextRange::new(decl_start, type_end),
        name_range: TextRange::new(name_start, name_end),
        extra_dims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_class_with_methods_and_fields() {
        let src = r#"package com.example;

import java.util.List;
import static java.util.Arrays.asList;

/** A thing. */
public class Thing extends Base implements Runnable {
    private int count;

    /** Runs it. */
    public void run() {
        count++;
    }

    protected String describe(int depth, String... tags) throws java.io.IOException {
        return "";
    }
}
"#;
        let parsed = parse_file("Thing.java", src);
        assert_eq!(parsed.package.as_deref(), Some("com.example"));
        assert_eq!(parsed.imports.len(), 2);
        assert!(parsed.imports[1].is_static);
        assert_eq!(parsed.imports[1].simple_name, "asList");

        assert_eq!(parsed.types.len(), 1);
        let ty = &parsed.types[0];
        assert_eq!(ty.name, "Thing");
        assert_eq!(ty.extends.as_deref(), Some("Base"));
        assert_eq!(ty.implements, vec!["Runnable".to_string()]);
        assert_eq!(ty.visibility, Visibility::Public);
        assert!(ty.doc_range.is_some());

        assert_eq!(ty.fields.len(), 1);
        assert_eq!(ty.fields[0].name, "count");
        assert_eq!(ty.fields[0].visibility, Visibility::Private);

        assert_eq!(ty.methods.len(), 2);
        let run = &ty.methods[0];
        assert_eq!(run.name, "run");
        assert!(run.doc_range.is_some());
        assert_eq!(run.details.return_type.as_deref(), Some("void"));

        let describe = &ty.methods[1];
        assert_eq!(describe.visibility, Visibility::Protected);
        assert_eq!(describe.details.params.len(), 2);
        assert_eq!(describe.details.params[0].ty, "int");
        assert_eq!(describe.details.params[1].ty, "String...");
        assert!(describe.details.params[1].is_varargs);
        assert!(describe.details.is_varargs);
        assert_eq!(describe.details.throws, vec!["java.io.IOException"]);
    }

    #[test]
    fn parses_constructor_without_return_type() {
        let src = r#"class Box {
    private final int size;

    Box(int size) {
        this.size = size;
    }

    int size() { return size; }
}
"#;
        let parsed = parse_file("Box.java", src);
        let ty = &parsed.types[0];
        assert_eq!(ty.methods.len(), 2);
        assert!(ty.methods[0].details.is_constructor);
        assert!(ty.methods[0].details.return_type.is_none());
        assert!(!ty.methods[1].details.is_constructor);
    }

    #[test]
    fn parses_enum_constants_and_members() {
        let src = r#"enum Mode {
    FAST, SLOW(10), CAREFUL {
        void tune() {}
    };

    void apply() {}
}
"#;
        let parsed = parse_file("Mode.java", src);
        let ty = &parsed.types[0];
        assert_eq!(
            ty.enum_constants
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>(),
            vec!["FAST", "SLOW", "CAREFUL"]
        );
        assert_eq!(ty.methods.len(), 1);
        assert_eq!(ty.methods[0].name, "apply");
    }

    #[test]
    fn parses_nested_and_generic_declarations() {
        let src = r#"public class Outer<T> {
    static class Inner {
        <R> R map(T value, java.util.function.Function<T, R> fn) {
            return fn.apply(value);
        }
    }
}
"#;
        let parsed = parse_file("Outer.java", src);
        assert_eq!(parsed.types.len(), 2);
        let inner = parsed.types.iter().find(|t| t.name == "Inner").unwrap();
        assert_eq!(inner.container.as_deref(), Some("Outer"));
        let map = &inner.methods[0];
        assert_eq!(map.details.type_params, vec!["R".to_string()]);
        assert_eq!(map.details.params.len(), 2);
        assert_eq!(map.details.params[1].name, "fn");
    }

    #[test]
    fn strip_simple_name_handles_qualifiers_generics_arrays() {
        assert_eq!(strip_simple_name("foo.bar.Baz"), "Baz");
        assert_eq!(strip_simple_name("Map<String, Integer>"), "Map");
        assert_eq!(strip_simple_name("int[]"), "int");
        assert_eq!(strip_simple_name("String..."), "String");
    }
}
