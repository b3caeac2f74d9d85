use crate::ast::Value;

/// Formats runtime values for display next to a node.
pub struct ValueFormatter;

impl ValueFormatter {
    /// Format a value, or its absence, as a short human-readable string.
    pub fn format(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::Number(n)) => Self::format_number(*n),
            Some(Value::Bool(true)) => "True".to_string(),
            Some(Value::Bool(false)) => "False".to_string(),
            Some(Value::Str(s)) => s.clone(),
            Some(complex @ (Value::List(_) | Value::Record(_))) => serde_json::to_string(complex)
                .unwrap_or_else(|_| "[Complex Object]".to_string()),
        }
    }

    fn format_number(n: f64) -> String {
        if n.is_nan() {
            "NaN".to_string()
        } else if n.is_infinite() {
            if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        } else if n == 0.0 {
            "0".to_string()
        } else if n.fract() == 0.0 {
            format!("{:.0}", n)
        } else {
            format!("{:.2}", n)
        }
    }
}

/// Shorthand for [`ValueFormatter::format`].
pub fn format_value_for_display(value: Option<&Value>) -> String {
    ValueFormatter::format(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fmt(value: Value) -> String {
        format_value_for_display(Some(&value))
    }

    #[test]
    fn numbers() {
        assert_eq!(fmt(Value::Number(4750.0)), "4750");
        assert_eq!(fmt(Value::Number(4750.5)), "4750.50");
        assert_eq!(fmt(Value::Number(-0.126)), "-0.13");
        assert_eq!(fmt(Value::Number(-0.0)), "0");
        assert_eq!(fmt(Value::Number(1e21)), "1000000000000000000000");
        assert_eq!(fmt(Value::Number(f64::NAN)), "NaN");
        assert_eq!(fmt(Value::Number(f64::NEG_INFINITY)), "-Infinity");
    }

    #[test]
    fn missing_and_null_are_not_available() {
        assert_eq!(format_value_for_display(None), "N/A");
        assert_eq!(fmt(Value::Null), "N/A");
    }

    #[test]
    fn booleans_and_strings() {
        assert_eq!(fmt(Value::Bool(true)), "True");
        assert_eq!(fmt(Value::Bool(false)), "False");
        assert_eq!(fmt(Value::from("Aiko")), "Aiko");
    }

    #[test]
    fn complex_values_serialize_as_json() {
        let mut record = BTreeMap::new();
        record.insert("base".to_string(), Value::Number(1.5));
        record.insert("tags".to_string(), Value::List(vec![Value::from("a"), Value::Null]));
        assert_eq!(fmt(Value::Record(record)), r#"{"base":1.5,"tags":["a",null]}"#);
    }
}
