use super::name::check_variable_name;
use crate::ast::{Bindings, Value};
use crate::error::VariableError;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalKind {
    Constant,
    Variable,
}

/// A named value shared by every flow. Identity is `id`, not `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub id: u64,
    pub name: String,
    pub value: Value,
    pub kind: GlobalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The ordered set of global variables.
///
/// Names are valid identifiers and unique at all times. Serializes as a plain
/// list so it round-trips through the external store unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GlobalVariable>", into = "Vec<GlobalVariable>")]
pub struct GlobalRegistry {
    variables: Vec<GlobalVariable>,
    next_id: u64,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from stored variables, keeping their ids.
    pub fn from_vec(variables: Vec<GlobalVariable>) -> Result<Self, VariableError> {
        let mut registry = Self::new();
        for variable in variables {
            validate_name(&variable.name)?;
            if registry.get(variable.id).is_some() {
                return Err(VariableError::DuplicateId(variable.id));
            }
            if registry.find(&variable.name).is_some() {
                return Err(VariableError::DuplicateName(variable.name));
            }
            registry.next_id = registry.next_id.max(variable.id.saturating_add(1));
            registry.variables.push(variable);
        }
        Ok(registry)
    }

    /// Adds a variable and returns its id.
    pub fn create(
        &mut self,
        name: &str,
        value: Value,
        kind: GlobalKind,
        description: Option<String>,
    ) -> Result<u64, VariableError> {
        validate_name(name)?;
        if self.find(name).is_some() {
            return Err(VariableError::DuplicateName(name.to_string()));
        }
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, name, ?kind, "created global variable");
        self.variables.push(GlobalVariable {
            id,
            name: name.to_string(),
            value,
            kind,
            description,
        });
        Ok(id)
    }

    pub fn rename(&mut self, id: u64, name: &str) -> Result<(), VariableError> {
        validate_name(name)?;
        if self.find(name).is_some_and(|other| other.id != id) {
            return Err(VariableError::DuplicateName(name.to_string()));
        }
        let variable = self.get_mut(id)?;
        variable.name = name.to_string();
        Ok(())
    }

    pub fn set_value(&mut self, id: u64, value: Value) -> Result<(), VariableError> {
        let variable = self.get_mut(id)?;
        if variable.kind == GlobalKind::Constant {
            return Err(VariableError::ConstantImmutable(variable.name.clone()));
        }
        variable.value = value;
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Result<GlobalVariable, VariableError> {
        let index = self
            .variables
            .iter()
            .position(|v| v.id == id)
            .ok_or(VariableError::NotFound(id))?;
        Ok(self.variables.remove(index))
    }

    pub fn get(&self, id: u64) -> Option<&GlobalVariable> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn find(&self, name: &str) -> Option<&GlobalVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalVariable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// The lowest binding layer: every global by name.
    pub fn to_bindings(&self) -> Bindings {
        self.variables
            .iter()
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect()
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut GlobalVariable, VariableError> {
        self.variables
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(VariableError::NotFound(id))
    }
}

fn validate_name(name: &str) -> Result<(), VariableError> {
    check_variable_name(name).map_err(|message| VariableError::InvalidName {
        name: name.to_string(),
        message,
    })
}

impl TryFrom<Vec<GlobalVariable>> for GlobalRegistry {
    type Error = VariableError;

    fn try_from(variables: Vec<GlobalVariable>) -> Result<Self, Self::Error> {
        Self::from_vec(variables)
    }
}

impl From<GlobalRegistry> for Vec<GlobalVariable> {
    fn from(registry: GlobalRegistry) -> Self {
        registry.variables
    }
}
