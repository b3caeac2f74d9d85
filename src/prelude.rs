//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the keisan crate.
//!
//! # Example
//!
//! ```rust
//! use keisan::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let input = FlowInput::sample();
//! let bindings = input.bindings()?;
//!
//! let validation = Analyzer::new(Dialect::Formula).analyze("salary * (1 - taxRate)", &bindings);
//! assert!(validation.all_valid);
//!
//! let result = Evaluator::new(Dialect::Formula).evaluate("salary * (1 - taxRate)", &bindings);
//! println!("Net: {}", format_value_for_display(result.value.as_ref()));
//! # Ok(())
//! # }
//! # run_example().unwrap();
//! ```

// Analysis and evaluation
pub use crate::analyzer::{Analyzer, ValidationResult, analyze};
pub use crate::config::EngineConfig;
pub use crate::evaluator::{EvaluationResult, Evaluator, evaluate, evaluate_code};
pub use crate::parser::Dialect;

// Values and bindings
pub use crate::ast::{Bindings, Value};

// Display
pub use crate::display::{HighlightCategory, HighlightSpan, format_value_for_display, highlight};

// Flows and variables
pub use crate::data::FlowInput;
pub use crate::flow::{
    FlowDefinition, FlowEdgeDefinition, FlowNodeDefinition, FlowReport, FlowRunner, IntoFlow,
    NodeKind, NodeOutcome, NodeStatus,
};
pub use crate::variables::{
    BindingLayers, GlobalKind, GlobalRegistry, GlobalVariable, validate_variable_name,
};

// Error types
pub use crate::error::{ErrorKind, FlowError, ValidationError, VariableError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
