use super::definition::{FlowNodeDefinition, NodeKind};
use crate::analyzer::{Analyzer, ValidationResult};
use crate::ast::{Bindings, Value};
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::evaluator::{EvaluationResult, Evaluator};
use crate::parser::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a node did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Only reachable through the other branch of this condition node.
    BranchNotTaken { condition: String },
    /// Only reachable through this failed node.
    UpstreamFailed { node_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeStatus {
    Evaluated,
    /// Syntax error, unbound identifiers, or a runtime error. The result is not published.
    Failed,
    Skipped(SkipReason),
}

/// What happened at one node during a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutcome {
    pub node_id: String,
    pub status: NodeStatus,
    pub validation: Option<ValidationResult>,
    pub evaluation: Option<EvaluationResult>,
}

impl NodeOutcome {
    pub(super) fn skipped(node_id: &str, reason: SkipReason) -> Self {
        Self {
            node_id: node_id.to_string(),
            status: NodeStatus::Skipped(reason),
            validation: None,
            evaluation: None,
        }
    }

    fn finished(node_id: &str, validation: ValidationResult, evaluation: EvaluationResult) -> Self {
        let status = if validation.all_valid && evaluation.is_ok() {
            NodeStatus::Evaluated
        } else {
            NodeStatus::Failed
        };
        Self {
            node_id: node_id.to_string(),
            status,
            validation: Some(validation),
            evaluation: Some(evaluation),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.status == NodeStatus::Evaluated
    }

    /// The node's value when it evaluated successfully.
    pub fn value(&self) -> Option<&Value> {
        if !self.is_evaluated() {
            return None;
        }
        self.evaluation.as_ref()?.value.as_ref()
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.evaluation.as_ref()?.error.as_ref()
    }
}

/// Runs a single node against the bindings visible to it.
pub(super) fn evaluate_node(
    node: &FlowNodeDefinition,
    bindings: &Bindings,
    employee: &BTreeMap<String, Value>,
    config: &EngineConfig,
) -> NodeOutcome {
    match &node.kind {
        NodeKind::Employee { fields } => publish_employee(&node.id, fields, employee, config),
        NodeKind::Computation { expression, .. } => {
            run_expression(&node.id, expression, Dialect::Formula, bindings, config)
        }
        NodeKind::Condition { condition } => {
            run_expression(&node.id, condition, Dialect::Condition, bindings, config)
        }
        NodeKind::Code { code, .. } => run_expression(&node.id, code, Dialect::Code, bindings, config),
        NodeKind::Output { source, .. } => {
            let value = bindings.get(source);
            let validation = lookup_result([(source.as_str(), value.is_some())], config);
            let evaluation = match value {
                Some(value) => EvaluationResult::success(value.clone()),
                None => EvaluationResult::failure(ValidationError::missing_variable(source)),
            };
            NodeOutcome::finished(&node.id, validation, evaluation)
        }
    }
}

fn run_expression(
    node_id: &str,
    source: &str,
    dialect: Dialect,
    bindings: &Bindings,
    config: &EngineConfig,
) -> NodeOutcome {
    let validation = Analyzer::new(dialect)
        .with_reserved_keywords(config.reserved_keywords)
        .with_max_depth(config.max_depth)
        .analyze(source, bindings);
    if !validation.all_valid {
        let error = validation
            .first_error()
            .cloned()
            .unwrap_or_else(ValidationError::empty_expression);
        return NodeOutcome::finished(node_id, validation, EvaluationResult::failure(error));
    }
    let evaluation = Evaluator::new(dialect)
        .with_config(*config)
        .evaluate(source, bindings);
    NodeOutcome::finished(node_id, validation, evaluation)
}

/// Publishes the requested employee fields as one record value.
fn publish_employee(
    node_id: &str,
    fields: &[String],
    employee: &BTreeMap<String, Value>,
    config: &EngineConfig,
) -> NodeOutcome {
    let requested: Vec<&str> = if fields.is_empty() {
        employee.keys().map(String::as_str).collect()
    } else {
        fields.iter().map(String::as_str).collect()
    };
    let validation = lookup_result(
        requested
            .iter()
            .map(|field| (*field, employee.contains_key(*field))),
        config,
    );
    let evaluation = match validation.first_error() {
        Some(error) => EvaluationResult::failure(error.clone()),
        None => EvaluationResult::success(Value::Record(
            requested
                .iter()
                .filter_map(|field| Some((field.to_string(), employee.get(*field)?.clone())))
                .collect(),
        )),
    };
    NodeOutcome::finished(node_id, validation, evaluation)
}

/// A validation result for plain name lookups.
fn lookup_result<'a>(
    names: impl IntoIterator<Item = (&'a str, bool)>,
    config: &EngineConfig,
) -> ValidationResult {
    let mut result = ValidationResult {
        keywords_reserved: config.reserved_keywords,
        ..ValidationResult::default()
    };
    for (name, bound) in names {
        if result.valid_variables.contains_key(name) {
            continue;
        }
        if !bound {
            result.errors.push(ValidationError::missing_variable(name));
        }
        result.valid_variables.insert(name.to_string(), bound);
    }
    result.all_valid = result.valid_variables.values().all(|bound| *bound);
    result
}
