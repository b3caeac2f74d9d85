use crate::ast::Value;
use crate::lexer::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The category of a problem reported to the UI for a single expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingVariable,
    SyntaxError,
    TypeError,
    EvaluationError,
    UndefinedError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingVariable => "MissingVariable",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::EvaluationError => "EvaluationError",
            ErrorKind::UndefinedError => "UndefinedError",
        };
        f.write_str(name)
    }
}

/// A typed, serializable error value rendered inline by the UI.
///
/// Both the analyzer and the evaluator report every failure through this type
/// instead of returning `Err`, so callers can store it next to the expression.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            identifier: None,
        }
    }

    pub fn empty_expression() -> Self {
        Self::new(ErrorKind::SyntaxError, "Expression is empty")
    }

    pub fn missing_variable(name: &str) -> Self {
        Self {
            kind: ErrorKind::MissingVariable,
            message: format!("Variable '{}' is not available", name),
            identifier: Some(name.to_string()),
        }
    }
}

/// Errors raised while turning source text into an AST.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {}", span.start)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl From<ParseError> for ValidationError {
    fn from(e: ParseError) -> Self {
        ValidationError::new(ErrorKind::SyntaxError, format!("Syntax error: {}", e))
    }
}

/// Errors that can occur while executing a parsed expression or code body.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("'{0}' is not defined")]
    UndefinedVariable(String),

    #[error("'{0}' is not a function")]
    NotCallable(String),

    #[error("{function} expects {expected} argument(s), but received {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("Cannot read property '{property}' of null")]
    NullAccess { property: String },

    #[error("Assignment to constant variable '{0}'")]
    ConstantReassignment(String),

    #[error("Identifier '{0}' has already been declared")]
    AlreadyDeclared(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Step budget of {0} exhausted")]
    StepBudgetExhausted(u64),
}

impl RuntimeError {
    /// The UI-facing category this runtime failure is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::TypeMismatch { .. }
            | RuntimeError::NotCallable(_)
            | RuntimeError::Arity { .. }
            | RuntimeError::NullAccess { .. }
            | RuntimeError::ConstantReassignment(_) => ErrorKind::TypeError,
            RuntimeError::UndefinedVariable(_) => ErrorKind::UndefinedError,
            RuntimeError::AlreadyDeclared(_)
            | RuntimeError::DivisionByZero
            | RuntimeError::StepBudgetExhausted(_) => ErrorKind::EvaluationError,
        }
    }
}

impl From<RuntimeError> for ValidationError {
    fn from(e: RuntimeError) -> Self {
        let identifier = match &e {
            RuntimeError::UndefinedVariable(name)
            | RuntimeError::ConstantReassignment(name)
            | RuntimeError::AlreadyDeclared(name) => Some(name.clone()),
            _ => None,
        };
        ValidationError {
            kind: e.kind(),
            message: e.to_string(),
            identifier,
        }
    }
}

/// Errors raised by the global variable registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableError {
    #[error("Invalid variable name '{name}': {message}")]
    InvalidName { name: String, message: String },

    #[error("A global variable named '{0}' already exists")]
    DuplicateName(String),

    #[error("Global variable id {0} is used more than once")]
    DuplicateId(u64),

    #[error("Global variable #{0} not found")]
    NotFound(u64),

    #[error("Global variable '{0}' is a constant and cannot be changed")]
    ConstantImmutable(String),
}

/// Errors that prevent a flow from being resolved at all.
///
/// Problems inside a single node are reported on that node's outcome instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(
        "Node '{missing_node_id}' not found, which is required by a connection from node '{source_node_id}'"
    )]
    NodeNotFound {
        missing_node_id: String,
        source_node_id: String,
    },

    #[error("Node id '{0}' is used more than once")]
    DuplicateNode(String),

    #[error("The flow contains a cycle through node '{0}'")]
    Cycle(String),

    #[error("Node '{node_id}' declares an invalid result variable: {message}")]
    InvalidResultVariable { node_id: String, message: String },
}

/// Errors that can occur when converting a custom user format into a `FlowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error("Unknown node type '{type_name}' on node '{node_id}'")]
    UnknownNodeType { node_id: String, type_name: String },
}

/// Errors raised while loading engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

/// Errors raised while loading runtime input data.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Failed to read data file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Variable(#[from] VariableError),
}
