use std::fmt;

/// Functions callable from inside the sandbox.
///
/// This is the operator/function allow-list shared by the parser (which
/// resolves calls to these at parse time), the analyzer and the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    Round,
    Floor,
    Ceil,
    Trunc,
    Sign,
    Sqrt,
    Pow,
    Min,
    Max,
    ToNumber,
    ToText,
    ToBoolean,
    ConsoleLog,
}

/// Math functions that may be called without the `Math.` prefix.
const MATH_FUNCTIONS: &[(&str, Builtin)] = &[
    ("abs", Builtin::Abs),
    ("round", Builtin::Round),
    ("floor", Builtin::Floor),
    ("ceil", Builtin::Ceil),
    ("trunc", Builtin::Trunc),
    ("sign", Builtin::Sign),
    ("sqrt", Builtin::Sqrt),
    ("pow", Builtin::Pow),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
];

/// Constants reachable through the `Math` namespace.
const MATH_CONSTANTS: &[(&str, f64)] = &[("PI", std::f64::consts::PI), ("E", std::f64::consts::E)];

impl Builtin {
    /// Resolves a bare call such as `max(a, b)`.
    pub fn bare(name: &str) -> Option<Builtin> {
        match name {
            "Number" => Some(Builtin::ToNumber),
            "String" => Some(Builtin::ToText),
            "Boolean" => Some(Builtin::ToBoolean),
            _ => MATH_FUNCTIONS
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, b)| *b),
        }
    }

    /// Resolves a namespaced call such as `Math.max(a, b)` or `console.log(x)`.
    pub fn namespaced(namespace: &str, name: &str) -> Option<Builtin> {
        match namespace {
            "Math" => MATH_FUNCTIONS
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, b)| *b),
            "console" if name == "log" => Some(Builtin::ConsoleLog),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Abs => "Math.abs",
            Builtin::Round => "Math.round",
            Builtin::Floor => "Math.floor",
            Builtin::Ceil => "Math.ceil",
            Builtin::Trunc => "Math.trunc",
            Builtin::Sign => "Math.sign",
            Builtin::Sqrt => "Math.sqrt",
            Builtin::Pow => "Math.pow",
            Builtin::Min => "Math.min",
            Builtin::Max => "Math.max",
            Builtin::ToNumber => "Number",
            Builtin::ToText => "String",
            Builtin::ToBoolean => "Boolean",
            Builtin::ConsoleLog => "console.log",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Looks up `Math.PI` / `Math.E`.
pub fn math_constant(namespace: &str, name: &str) -> Option<f64> {
    if namespace != "Math" {
        return None;
    }
    MATH_CONSTANTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

/// Whether `namespace.name` is an allow-listed operator sequence.
pub fn is_allow_listed_path(namespace: &str, name: &str) -> bool {
    Builtin::namespaced(namespace, name).is_some() || math_constant(namespace, name).is_some()
}

/// Whether a bare `name(` is an allow-listed function call.
pub fn is_allow_listed_call(name: &str) -> bool {
    Builtin::bare(name).is_some()
}
