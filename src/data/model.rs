use crate::ast::{Bindings, Value};
use crate::error::DataLoadError;
use crate::variables::{GlobalKind, GlobalRegistry, GlobalVariable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// Represents the runtime data for one flow run, matching the expected JSON format.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FlowInput {
    #[serde(default)]
    pub employee: BTreeMap<String, Value>,
    #[serde(default)]
    pub globals: Vec<GlobalVariable>,
}

impl FlowInput {
    /// Load input data from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DataLoadError> {
        let content = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
            path: path.to_string(),
            source,
        })?;
        let data = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Creates mock data when no file is provided.
    pub fn sample() -> Self {
        let mut employee = BTreeMap::new();
        employee.insert("name".to_string(), Value::from("Aiko Tanaka"));
        employee.insert("salary".to_string(), Value::Number(5000.0));
        employee.insert("workedDays".to_string(), Value::Number(21.0));

        let globals = vec![
            GlobalVariable {
                id: 1,
                name: "taxRate".to_string(),
                value: Value::Number(0.25),
                kind: GlobalKind::Constant,
                description: Some("Flat income tax rate".to_string()),
            },
            GlobalVariable {
                id: 2,
                name: "bonus".to_string(),
                value: Value::Number(1000.0),
                kind: GlobalKind::Variable,
                description: None,
            },
        ];

        Self { employee, globals }
    }

    /// Validates the globals into a registry.
    pub fn registry(&self) -> Result<GlobalRegistry, DataLoadError> {
        Ok(GlobalRegistry::from_vec(self.globals.clone())?)
    }

    /// Globals overlaid with employee fields, for evaluating a single expression.
    pub fn bindings(&self) -> Result<Bindings, DataLoadError> {
        let mut bindings = self.registry()?.to_bindings();
        bindings.extend(self.employee.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(bindings)
    }
}

/// Load a flat `{ "name": value }` JSON object as bindings.
pub fn load_bindings(path: &str) -> Result<Bindings, DataLoadError> {
    let content = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
