//! Payroll flows: node definitions, graph resolution and per-node evaluation.

mod conversion;
mod definition;
mod node;
mod runner;

pub use conversion::IntoFlow;
pub use definition::{FlowDefinition, FlowEdgeDefinition, FlowNodeDefinition, NodeKind};
pub use node::{NodeOutcome, NodeStatus, SkipReason};
pub use runner::{FlowReport, FlowRunner, FlowRunnerBuilder};
