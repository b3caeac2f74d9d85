//! Common test utilities for building bindings, globals and flows.
use keisan::prelude::*;
use std::collections::BTreeMap;

/// Builds bindings from `(name, value)` pairs.
#[allow(dead_code)]
pub fn bindings<V: Into<Value> + Clone>(pairs: &[(&str, V)]) -> Bindings {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone().into()))
        .collect()
}

/// The bindings of the payroll scenario: `salary`, `taxRate` and `bonus`.
#[allow(dead_code)]
pub fn payroll_bindings() -> Bindings {
    bindings(&[("salary", 5000.0), ("taxRate", 0.25), ("bonus", 1000.0)])
}

/// An employee record with a salary and a name.
#[allow(dead_code)]
pub fn employee(salary: f64) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("name".to_string(), Value::from("Aiko Tanaka")),
        ("salary".to_string(), Value::Number(salary)),
    ])
}

/// `taxRate` (constant) and `bonus` (variable).
#[allow(dead_code)]
pub fn payroll_globals() -> GlobalRegistry {
    let mut globals = GlobalRegistry::new();
    globals
        .create("taxRate", Value::Number(0.25), GlobalKind::Constant, None)
        .unwrap();
    globals
        .create("bonus", Value::Number(1000.0), GlobalKind::Variable, None)
        .unwrap();
    globals
}

#[allow(dead_code)]
pub fn computation(id: &str, expression: &str, result_variable: &str) -> FlowNodeDefinition {
    FlowNodeDefinition::new(
        id,
        NodeKind::Computation {
            expression: expression.to_string(),
            result_variable: result_variable.to_string(),
        },
    )
}

#[allow(dead_code)]
pub fn output(id: &str, field: &str, source: &str) -> FlowNodeDefinition {
    FlowNodeDefinition::new(
        id,
        NodeKind::Output {
            field: field.to_string(),
            source: source.to_string(),
        },
    )
}

/// Creates a flow that branches on the salary.
///
/// Logic: `salary > 4000` -> taxed net, otherwise net plus bonus, both written to `net`.
#[allow(dead_code)]
pub fn create_branching_flow() -> FlowDefinition {
    FlowDefinition {
        nodes: vec![
            FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec!["salary".into()] }),
            FlowNodeDefinition::new(
                "high",
                NodeKind::Condition {
                    condition: "salary > 4000".to_string(),
                },
            ),
            computation("taxed", "salary * (1 - taxRate)", "netSalary"),
            FlowNodeDefinition::new(
                "boosted",
                NodeKind::Code {
                    code: "let net = salary\nnet += bonus\nreturn net".to_string(),
                    result_variable: "netSalary".to_string(),
                },
            ),
            output("out", "net", "netSalary"),
        ],
        edges: vec![
            FlowEdgeDefinition::new("employee", "high"),
            FlowEdgeDefinition::with_handle("high", "true", "taxed"),
            FlowEdgeDefinition::with_handle("high", "false", "boosted"),
            FlowEdgeDefinition::new("taxed", "out"),
            FlowEdgeDefinition::new("boosted", "out"),
        ],
    }
}
