use crate::ast::{Bindings, Value};
use tracing::trace;

/// The namespace visible at one node, kept as separate layers until merged.
///
/// Later layers shadow earlier ones by name: globals, then employee fields,
/// then computed results in the order they were pushed. Collisions are not
/// an error.
#[derive(Debug, Clone, Default)]
pub struct BindingLayers {
    globals: Bindings,
    employee: Bindings,
    computed: Vec<(String, Value)>,
}

impl BindingLayers {
    pub fn new(globals: Bindings) -> Self {
        Self {
            globals,
            ..Self::default()
        }
    }

    pub fn add_employee_field(&mut self, name: impl Into<String>, value: Value) {
        self.employee.insert(name.into(), value);
    }

    pub fn push_computed(&mut self, name: impl Into<String>, value: Value) {
        self.computed.push((name.into(), value));
    }

    /// Flattens the layers into one mapping. The layers themselves are left untouched.
    pub fn merge(&self) -> Bindings {
        let mut merged = self.globals.clone();
        for (name, value) in &self.employee {
            if merged.insert(name.clone(), value.clone()).is_some() {
                trace!(name = name.as_str(), "employee field shadows a global");
            }
        }
        for (name, value) in &self.computed {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}
