//! Reserved words of the expression language.

/// Words the grammar gives meaning to. They can never name a variable.
const SYNTAX_KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof",
    "let", "new", "return", "super", "switch", "this", "throw", "try", "typeof", "var", "void",
    "while", "with", "yield",
];

/// Literal tokens.
const LITERAL_KEYWORDS: &[&str] = &["true", "false", "null", "undefined"];

/// Built-in namespaces and conversion functions.
const BUILTIN_OBJECTS: &[&str] = &[
    "Math", "String", "Array", "console", "Number", "Boolean", "Object", "JSON",
];

pub fn is_syntax_keyword(word: &str) -> bool {
    SYNTAX_KEYWORDS.contains(&word)
}

pub fn is_literal_keyword(word: &str) -> bool {
    LITERAL_KEYWORDS.contains(&word)
}

/// The full reserved set: syntax keywords, literal tokens and built-in object names.
pub fn is_reserved(word: &str) -> bool {
    is_syntax_keyword(word) || is_literal_keyword(word) || BUILTIN_OBJECTS.contains(&word)
}
