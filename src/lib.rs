//! # Keisan - Expression Validation and Sandboxed Evaluation for Payroll Flows
//!
//! **Keisan** backs the Computation, Condition and Code nodes of a node-based
//! payroll flow editor. It checks user-written formulas against the variables
//! available at a node, evaluates them in a sandbox that exposes nothing but
//! those variables, and renders results and highlighted expressions for the UI.
//!
//! ## Core Workflow
//!
//! 1.  **Analyze**: `analyze` (or an `Analyzer` for a specific dialect) parses an expression and
//!     reports which identifiers are bound, as a `ValidationResult`.
//! 2.  **Evaluate**: `evaluate` (or an `Evaluator`) runs it against a flat `Bindings` map. Every
//!     failure comes back as a typed `ValidationError` inside the `EvaluationResult`.
//! 3.  **Display**: `format_value_for_display` and `highlight` turn values and expressions into
//!     what the editor shows.
//! 4.  **Run a flow**: convert your canvas format with `IntoFlow`, then let a `FlowRunner`
//!     resolve the graph and evaluate every node with layered bindings (globals, employee
//!     fields, upstream results).
//!
//! ## Quick Start
//!
//! ```rust
//! use keisan::prelude::*;
//! use std::collections::BTreeMap;
//!
//! fn main() -> Result<()> {
//!     let mut globals = GlobalRegistry::new();
//!     globals.create("taxRate", Value::Number(0.25), GlobalKind::Constant, None)?;
//!     globals.create("bonus", Value::Number(1000.0), GlobalKind::Variable, None)?;
//!
//!     let flow = FlowDefinition {
//!         nodes: vec![
//!             FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec![] }),
//!             FlowNodeDefinition::new(
//!                 "net",
//!                 NodeKind::Computation {
//!                     expression: "salary * (1 - taxRate) + bonus".to_string(),
//!                     result_variable: "netSalary".to_string(),
//!                 },
//!             ),
//!             FlowNodeDefinition::new(
//!                 "out",
//!                 NodeKind::Output { field: "net".to_string(), source: "netSalary".to_string() },
//!             ),
//!         ],
//!         edges: vec![
//!             FlowEdgeDefinition::new("employee", "net"),
//!             FlowEdgeDefinition::new("net", "out"),
//!         ],
//!     };
//!
//!     let runner = FlowRunner::builder(flow).with_globals(globals).build();
//!     let employee = BTreeMap::from([("salary".to_string(), Value::Number(5000.0))]);
//!     let report = runner.run(&employee)?;
//!
//!     assert_eq!(report.output["net"], Value::Number(4750.0));
//!     assert_eq!(format_value_for_display(report.output.get("net")), "4750");
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod flow;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod variables;

pub use analyzer::{Analyzer, ValidationResult, analyze};
pub use ast::{Bindings, Value};
pub use config::EngineConfig;
pub use display::{HighlightCategory, HighlightSpan, format_value_for_display, highlight};
pub use error::{ErrorKind, ValidationError};
pub use evaluator::{EvaluationResult, Evaluator, evaluate, evaluate_code};
pub use parser::Dialect;
pub use variables::{NameValidation, validate_variable_name};
