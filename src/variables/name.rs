use crate::keywords;
use serde::{Deserialize, Serialize};

/// The outcome of checking a candidate variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameValidation {
    pub is_valid: bool,
    pub error: Option<String>,
}

/// Checks a name against the identifier grammar and the reserved set. The first failing rule wins.
pub fn check_variable_name(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("Variable name cannot be empty".to_string());
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err("Variable name must start with a letter or underscore".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Variable name can only contain letters, numbers, and underscores".to_string());
    }
    if keywords::is_reserved(name) {
        return Err(format!("'{}' is a reserved JavaScript keyword", name));
    }
    Ok(())
}

/// Validates a user-entered variable name for display in a form.
pub fn validate_variable_name(name: &str) -> NameValidation {
    match check_variable_name(name) {
        Ok(()) => NameValidation {
            is_valid: true,
            error: None,
        },
        Err(error) => NameValidation {
            is_valid: false,
            error: Some(error),
        },
    }
}
