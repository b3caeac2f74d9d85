use crate::analyzer::Analyzer;
use crate::ast::{Bindings, Value};
use crate::config::EngineConfig;
use crate::error::{ErrorKind, ValidationError};
use crate::parser::Dialect;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod builtins;
mod engine;

use engine::AstEngine;

/// The result of an evaluation run. Exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub value: Option<Value>,
    pub error: Option<ValidationError>,
}

impl EvaluationResult {
    pub fn success(value: Value) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn failure(error: ValidationError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Value, ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value.unwrap_or_default()),
        }
    }
}

/// Runs expressions of one dialect inside the sandbox.
///
/// An `Evaluator` holds no state between runs and can be shared freely.
/// Each run analyzes the input first (with keywords reserved) and only
/// executes it when every referenced identifier is bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    dialect: Dialect,
    config: EngineConfig,
}

impl Evaluator {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Evaluates `source` against exactly the names in `bindings`.
    ///
    /// # Returns
    ///
    /// * `value`: the result of the expression, or of the code body's `return` (null without one).
    /// * `error`: the first analysis problem, or the runtime failure that stopped execution.
    pub fn evaluate(&self, source: &str, bindings: &Bindings) -> EvaluationResult {
        let analyzer = Analyzer::new(self.dialect)
            .with_reserved_keywords(true)
            .with_max_depth(self.config.max_depth);
        let (validation, program) = analyzer.check(source, bindings);

        let program = match (validation.all_valid, program) {
            (true, Some(program)) => program,
            _ => {
                let error = validation
                    .errors
                    .into_iter()
                    .next()
                    .unwrap_or_else(ValidationError::empty_expression);
                return EvaluationResult::failure(error);
            }
        };

        let mut engine = AstEngine::new(bindings, self.config.max_steps);
        let result = match engine.run(&program) {
            Ok(value) => self.check_result(value),
            Err(e) => EvaluationResult::failure(e.into()),
        };
        debug!(dialect = ?self.dialect, ok = result.is_ok(), "evaluated expression");
        result
    }

    fn check_result(&self, value: Value) -> EvaluationResult {
        match (self.dialect, &value) {
            (Dialect::Condition, Value::Bool(_)) | (Dialect::Formula | Dialect::Code, _) => {
                EvaluationResult::success(value)
            }
            (Dialect::Condition, other) => EvaluationResult::failure(ValidationError::new(
                ErrorKind::TypeError,
                format!(
                    "Condition must evaluate to a boolean, but found {}",
                    other.type_name()
                ),
            )),
        }
    }
}

/// Evaluates a formula against `bindings`.
///
/// # Example
///
/// ```
/// use keisan::{Bindings, Value, evaluate};
///
/// let bindings: Bindings = [("x".to_string(), Value::Number(42.0))].into_iter().collect();
/// let result = evaluate("x", &bindings);
/// assert_eq!(result.value, Some(Value::Number(42.0)));
/// assert!(result.error.is_none());
/// ```
pub fn evaluate(expression: &str, bindings: &Bindings) -> EvaluationResult {
    Evaluator::new(Dialect::Formula).evaluate(expression, bindings)
}

/// Evaluates a multi-statement code body against `bindings`.
pub fn evaluate_code(code: &str, bindings: &Bindings) -> EvaluationResult {
    Evaluator::new(Dialect::Code).evaluate(code, bindings)
}
