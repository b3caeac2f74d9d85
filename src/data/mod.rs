//! Runtime input data for flows and single expressions.

mod model;

pub use model::{FlowInput, load_bindings};
