//! Variable names, the global variable registry and binding layers.

mod global;
mod layers;
mod name;

pub use global::{GlobalKind, GlobalRegistry, GlobalVariable};
pub use layers::BindingLayers;
pub use name::{NameValidation, check_variable_name, validate_variable_name};
