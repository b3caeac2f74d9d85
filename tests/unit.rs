//! Unit-level tests of the public helpers: names, globals, formatting, configuration and input data.
use keisan::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[cfg(test)]
mod name_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use keisan::NameValidation;

    #[test]
    fn test_hyphenated_name_is_rejected() {
        assert_eq!(
            validate_variable_name("net-salary"),
            NameValidation {
                is_valid: false,
                error: Some(
                    "Variable name can only contain letters, numbers, and underscores".to_string()
                ),
            }
        );
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let error = |name: &str| validate_variable_name(name).error;
        assert_eq!(error(""), Some("Variable name cannot be empty".to_string()));
        assert_eq!(
            error("1st-rate"),
            Some("Variable name must start with a letter or underscore".to_string())
        );
        assert_eq!(error("return"), Some("'return' is a reserved JavaScript keyword".to_string()));
        assert_eq!(error("Math"), Some("'Math' is a reserved JavaScript keyword".to_string()));
        assert_eq!(error("netSalary"), None);
    }
}

#[cfg(test)]
mod global_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_lifecycle() {
        let mut globals = GlobalRegistry::new();
        let rate = globals
            .create("taxRate", Value::Number(0.2), GlobalKind::Constant, None)
            .unwrap();
        let bonus = globals
            .create("bonus", Value::Number(500.0), GlobalKind::Variable, None)
            .unwrap();
        assert_ne!(rate, bonus);

        assert_eq!(
            globals.set_value(rate, Value::Number(0.3)),
            Err(VariableError::ConstantImmutable("taxRate".to_string()))
        );
        globals.set_value(bonus, Value::Number(750.0)).unwrap();
        assert_eq!(
            globals.rename(bonus, "taxRate"),
            Err(VariableError::DuplicateName("taxRate".to_string()))
        );
        globals.rename(bonus, "yearEndBonus").unwrap();

        let bindings = globals.to_bindings();
        assert_eq!(bindings["yearEndBonus"], Value::Number(750.0));
        assert!(!bindings.contains_key("bonus"));

        globals.remove(rate).unwrap();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals.remove(rate), Err(VariableError::NotFound(rate)));
    }

    #[test]
    fn test_registry_round_trips_as_a_list() {
        let json = r#"[
            { "id": 4, "name": "taxRate", "value": 0.25, "kind": "constant" },
            { "id": 9, "name": "bonus", "value": 1000, "kind": "variable", "description": "Yearly" }
        ]"#;
        let mut globals: GlobalRegistry = serde_json::from_str(json).unwrap();
        let id = globals
            .create("allowance", Value::Number(20.0), GlobalKind::Variable, None)
            .unwrap();
        assert_eq!(id, 10);

        let stored = serde_json::to_value(&globals).unwrap();
        assert_eq!(stored[0]["kind"], serde_json::json!("constant"));
        assert_eq!(stored.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_registry_rejects_bad_stored_data() {
        let duplicate = r#"[
            { "id": 1, "name": "rate", "value": 1, "kind": "constant" },
            { "id": 2, "name": "rate", "value": 2, "kind": "constant" }
        ]"#;
        assert!(serde_json::from_str::<GlobalRegistry>(duplicate).is_err());

        let invalid = r#"[{ "id": 1, "name": "net salary", "value": 1, "kind": "variable" }]"#;
        assert!(serde_json::from_str::<GlobalRegistry>(invalid).is_err());
    }

    #[test]
    fn test_binding_layers_shadow_in_order() {
        let mut layers = BindingLayers::new(payroll_globals_bindings());
        layers.add_employee_field("bonus", Value::Number(10.0));
        layers.push_computed("net", Value::Number(1.0));
        layers.push_computed("net", Value::Number(2.0));

        let merged = layers.merge();
        assert_eq!(merged["bonus"], Value::Number(10.0));
        assert_eq!(merged["taxRate"], Value::Number(0.25));
        assert_eq!(merged["net"], Value::Number(2.0));
    }

    fn payroll_globals_bindings() -> Bindings {
        [
            ("taxRate".to_string(), Value::Number(0.25)),
            ("bonus".to_string(), Value::Number(1000.0)),
        ]
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_value_for_display() {
        assert_eq!(format_value_for_display(Some(&Value::Number(4750.0))), "4750");
        assert_eq!(format_value_for_display(Some(&Value::Number(4750.5))), "4750.50");
        assert_eq!(format_value_for_display(None), "N/A");
        assert_eq!(format_value_for_display(Some(&Value::Null)), "N/A");
        assert_eq!(format_value_for_display(Some(&Value::Bool(false))), "False");
        assert_eq!(format_value_for_display(Some(&Value::from("net"))), "net");

        let record = Value::Record(BTreeMap::from([("net".to_string(), Value::Number(1.5))]));
        assert_eq!(format_value_for_display(Some(&record)), r#"{"net":1.5}"#);
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_from_json_with_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_steps": 10000 }"#).unwrap();
        assert_eq!(config.max_steps, Some(10000));
        assert!(config.reserved_keywords);
        assert_eq!(config.max_depth, EngineConfig::default().max_depth);
    }

    #[test]
    fn test_config_rejects_zero_depth() {
        assert!(EngineConfig::from_json(r#"{ "max_depth": 0 }"#).is_err());
    }

    #[test]
    fn test_missing_config_file_names_the_path() {
        let error = EngineConfig::from_file("does/not/exist.json").unwrap_err();
        assert!(error.to_string().contains("does/not/exist.json"));
    }
}

#[cfg(test)]
mod data_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_input_bindings() {
        let bindings = FlowInput::sample().bindings().unwrap();
        assert_eq!(bindings["salary"], Value::Number(5000.0));
        assert_eq!(bindings["taxRate"], Value::Number(0.25));
        let result = evaluate("salary * (1 - taxRate) + bonus", &bindings);
        assert_eq!(result.value, Some(Value::Number(4750.0)));
    }

    #[test]
    fn test_input_parses_from_json() {
        let input: FlowInput = serde_json::from_str(
            r#"{ "employee": { "salary": 100 }, "globals": [{ "id": 1, "name": "rate", "value": 0.5, "kind": "constant" }] }"#,
        )
        .unwrap();
        let registry = input.registry().unwrap();
        assert_eq!(registry.find("rate").map(|v| v.kind), Some(GlobalKind::Constant));
        assert_eq!(input.bindings().unwrap().len(), 2);
    }
}
