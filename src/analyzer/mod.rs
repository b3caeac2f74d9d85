//! Static analysis of a single formula, condition or code body.
//!
//! The analyzer parses the input, then walks its identifier tokens and decides
//! for each one whether it is a keyword, part of an allow-listed built-in, or a
//! reference that must resolve against the supplied bindings.

use crate::ast::{Bindings, Program};
use crate::error::ValidationError;
use crate::lexer::tokenize;
use crate::parser::{Dialect, parse_tokens};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tracing::{debug, trace};

mod classify;

pub(crate) use classify::{TokenClass, classify_tokens};

/// Default parser nesting limit used when no `EngineConfig` is supplied.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The outcome of analyzing one expression.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Every referenced variable and whether it is bound.
    pub valid_variables: BTreeMap<String, bool>,
    pub all_valid: bool,
    /// In first-occurrence order.
    pub errors: Vec<ValidationError>,
    /// The keyword treatment this result was produced with. The highlighter reuses it.
    pub keywords_reserved: bool,
}

impl ValidationResult {
    fn failed(error: ValidationError, keywords_reserved: bool) -> Self {
        Self {
            valid_variables: BTreeMap::new(),
            all_valid: false,
            errors: vec![error],
            keywords_reserved,
        }
    }

    /// `Some(bound)` for referenced variables, `None` for anything not in the map.
    pub fn is_bound(&self, name: &str) -> Option<bool> {
        self.valid_variables.get(name).copied()
    }

    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Names referenced but not bound, in first-occurrence order.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().filter_map(|e| e.identifier.as_deref())
    }
}

/// Analyzes expressions of one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    dialect: Dialect,
    reserved_keywords: bool,
    max_depth: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Dialect::Formula)
    }
}

impl Analyzer {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            reserved_keywords: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_reserved_keywords(mut self, reserved: bool) -> Self {
        self.reserved_keywords = reserved;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Validates `source` against `bindings`. Never fails; problems are reported in the result.
    pub fn analyze(&self, source: &str, bindings: &Bindings) -> ValidationResult {
        self.check(source, bindings).0
    }

    /// Like `analyze`, but also hands back the parsed program when parsing succeeded.
    pub(crate) fn check(&self, source: &str, bindings: &Bindings) -> (ValidationResult, Option<Program>) {
        let reserved = self.reserved_keywords;
        if source.trim().is_empty() {
            return (
                ValidationResult::failed(ValidationError::empty_expression(), reserved),
                None,
            );
        }

        let tokens = tokenize(source);
        let program = match parse_tokens(&tokens, source.len(), self.dialect, self.max_depth) {
            Ok(program) => program,
            Err(e) => {
                debug!(dialect = ?self.dialect, error = %e, "expression failed to parse");
                return (ValidationResult::failed(e.into(), reserved), None);
            }
        };

        let declared = match self.dialect {
            Dialect::Code => program.declared_names(),
            Dialect::Formula | Dialect::Condition => BTreeSet::new(),
        };

        let mut valid_variables = BTreeMap::new();
        let mut errors = Vec::new();
        let classes = classify_tokens(&tokens, reserved);
        for (token, class) in tokens.iter().zip(classes) {
            let (Some(name), Some(class)) = (token.ident(), class) else {
                continue;
            };
            trace!(name, ?class, "classified identifier");
            if class != TokenClass::Variable || valid_variables.contains_key(name) {
                continue;
            }
            let bound = bindings.contains_key(name) || declared.contains(name);
            if !bound {
                errors.push(ValidationError::missing_variable(name));
            }
            valid_variables.insert(name.to_string(), bound);
        }

        let all_valid = valid_variables.values().all(|bound| *bound);
        debug!(
            dialect = ?self.dialect,
            variables = valid_variables.len(),
            missing = errors.len(),
            "analyzed expression"
        );
        let result = ValidationResult {
            valid_variables,
            all_valid,
            errors,
            keywords_reserved: reserved,
        };
        (result, Some(program))
    }
}

/// Analyzes a formula.
///
/// # Example
///
/// ```
/// use keisan::{Bindings, Value, analyze};
///
/// let mut bindings = Bindings::new();
/// bindings.insert("salary".to_string(), Value::Number(100.0));
///
/// let result = analyze("salary * rate", &bindings, true);
/// assert!(!result.all_valid);
/// assert_eq!(result.valid_variables["salary"], true);
/// assert_eq!(result.valid_variables["rate"], false);
/// ```
pub fn analyze(
    expression: &str,
    bindings: &Bindings,
    treat_keywords_as_reserved: bool,
) -> ValidationResult {
    Analyzer::new(Dialect::Formula)
        .with_reserved_keywords(treat_keywords_as_reserved)
        .analyze(expression, bindings)
}
