use recast_core::TextRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Type,
    Method,
    Field,
    EnumConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// Java access level, ordered from narrowest to widest.
///
/// The `Ord` derive is load-bearing: visibility adjustments compare levels
/// and only ever widen.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    schemars::JsonSchema,
)]
pub enum Visibility {
    Private,
    #[default]
    PackagePrivate,
    Protected,
    Public,
}

impl Visibility {
    /// The modifier keyword, or `None` for package-private (which has none).
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Visibility::Private => Some("private"),
            Visibility::PackagePrivate => None,
            Visibility::Protected => Some("protected"),
            Visibility::Public => Some("public"),
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }

    /// Numeric code used by the replayable descriptor (JVM-style flags).
    pub fn code(self) -> u8 {
        match self {
            Visibility::PackagePrivate => 0,
            Visibility::Public => 1,
            Visibility::Private => 2,
            Visibility::Protected => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Visibility::PackagePrivate),
            1 => Some(Visibility::Public),
            2 => Some(Visibility::Private),
            4 => Some(Visibility::Protected),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        self.keyword().unwrap_or("package-private")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub name: String,
    /// Container type name for members; enclosing type name for nested types.
    pub container: Option<String>,
    pub file: String,
    /// Byte range of the identifier token.
    pub name_range: TextRange,
    /// Byte range of the full declaration (modifiers through closing brace or
    /// semicolon). Does not include the doc comment.
    pub decl_range: TextRange,
    /// Range of the `/** ... */` comment attached to the declaration.
    pub doc_range: Option<TextRange>,
    /// Range between the declaration's braces, when it has a body.
    pub body_range: Option<TextRange>,
    pub visibility: Visibility,
    pub is_override: bool,
    /// Best-effort lexical parameter type strings, empty for non-methods.
    pub param_types: Vec<String>,
    pub param_names: Vec<String>,
    /// `class Foo extends Bar` base class, type symbols only.
    pub extends: Option<String>,
}

/// One declared method/constructor parameter, with the sub-ranges the
/// rewriting passes need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSketch {
    pub ty: String,
    pub name: String,
    pub is_varargs: bool,
    /// Full declaration span, from the first type token through the name.
    pub range: TextRange,
    pub type_range: TextRange,
    pub name_range: TextRange,
    /// Trailing `[]` count after the parameter name (old-style arrays).
    pub extra_dims: u8,
}

/// Everything the refactoring engine needs about a method declaration beyond
/// the lean [`Symbol`]. Kept in a side table so `Symbol` stays small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDetails {
    pub params: Vec<ParamSketch>,
    /// Span between the parameter list's parentheses.
    pub params_range: TextRange,
    /// `None` for constructors.
    pub return_type: Option<String>,
    pub return_type_range: Option<TextRange>,
    pub throws: Vec<String>,
    /// From the `throws` keyword through the last exception type.
    pub throws_range: Option<TextRange>,
    /// Insertion point for a `throws` clause when none exists: right after
    /// the closing paren (and extra dims, if any).
    pub throws_insert_offset: usize,
    /// Range of the explicit access modifier keyword, if present.
    pub visibility_range: Option<TextRange>,
    /// Offset where a new access modifier keyword can be inserted.
    pub modifier_insert_offset: usize,
    /// Generic type variables declared by the method itself (`<T> T foo()`).
    pub type_params: Vec<String>,
    /// Trailing `[]` count after the parameter list (old-style return dims).
    pub extra_dims: u8,
    pub is_constructor: bool,
    pub is_static: bool,
    pub is_native: bool,
    pub is_abstract: bool,
    pub is_varargs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub file: String,
    /// The whole `import ...;` statement, including the trailing newline when
    /// one directly follows.
    pub range: TextRange,
    /// Dotted path as written, without `static` and without a `.*` suffix.
    pub path: String,
    /// Last path segment (`*` for on-demand imports).
    pub simple_name: String,
    /// Range of the last path segment inside the statement.
    pub name_range: TextRange,
    pub is_static: bool,
    pub is_on_demand: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Identifier followed by `(` in executable code.
    Call,
    /// Identifier preceded by `::`.
    MethodRef,
    /// `#name(...)` occurrence inside a `/** ... */` comment.
    DocReference,
    /// Occurrence inside a `import static` declaration.
    StaticImport,
    FieldAccess,
    TypeUsage,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    pub file: String,
    pub range: TextRange,
    pub kind: ReferenceKind,
}
