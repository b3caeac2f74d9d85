//! Evaluator tests: results, typed errors and the sandbox boundary.
mod common;
use common::*;
use keisan::prelude::*;
use pretty_assertions::assert_eq;

#[cfg(test)]
mod evaluator_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_net_salary_formula() {
        let result = evaluate("salary * (1 - taxRate) + bonus", &payroll_bindings());
        assert_eq!(result, EvaluationResult::success(Value::Number(4750.0)));
    }

    #[test]
    fn test_comparison_result_is_boolean() {
        let result = evaluate("salary > 5000", &bindings(&[("salary", 5000.0)]));
        assert_eq!(result.value, Some(Value::Bool(false)));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_missing_variable_is_never_evaluated() {
        let result = evaluate("salary * rate", &bindings(&[("salary", 100.0)]));
        assert!(result.value.is_none());
        assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::MissingVariable));
    }

    #[test]
    fn test_empty_expression() {
        let result = evaluate("", &Bindings::new());
        assert_eq!(
            result.error.map(|e| (e.kind, e.message)),
            Some((ErrorKind::SyntaxError, "Expression is empty".to_string()))
        );
    }

    #[test]
    fn test_sandbox_escape_attempts_fail() {
        let probes = [
            "window.location",
            "globalThis",
            "this.constructor",
            "Function('return 1')()",
            "salary.constructor.constructor('return process')()",
        ];
        let bindings = bindings(&[("salary", 1.0)]);
        for probe in probes {
            let result = evaluate(probe, &bindings);
            assert!(result.value.is_none(), "{} produced a value", probe);
            assert!(result.error.is_some());
        }
    }

    #[test]
    fn test_evaluation_does_not_change_bindings() {
        let bindings = payroll_bindings();
        let before = bindings.clone();
        let code = "salary = 0\ntaxRate += 1\nreturn salary";
        let result = evaluate_code(code, &bindings);
        assert_eq!(result.value, Some(Value::Number(0.0)));
        assert_eq!(bindings, before);
    }

    #[test]
    fn test_ternary_and_logic() {
        let bindings = bindings(&[("days", 18.0), ("salary", 5000.0)]);
        let result = evaluate("days >= 20 ? salary : salary * days / 20", &bindings);
        assert_eq!(result.value, Some(Value::Number(4500.0)));
    }

    #[test]
    fn test_code_node_with_loop_and_early_return() {
        let bindings = bindings(&[("salary", 3000.0)]);
        let code = r#"
            let total = 0
            for (let month = 1; month <= 12; month++) {
                total += salary
                if (total > 20000) {
                    return month
                }
            }
            return total
        "#;
        assert_eq!(evaluate_code(code, &bindings).value, Some(Value::Number(7.0)));
    }

    #[test]
    fn test_runtime_errors_are_typed() {
        let cases = [
            ("1 / 0", ErrorKind::EvaluationError),
            ("true - 1", ErrorKind::TypeError),
            ("Math.sqrt()", ErrorKind::TypeError),
            ("null.salary", ErrorKind::TypeError),
        ];
        for (expression, kind) in cases {
            let result = evaluate(expression, &Bindings::new());
            assert_eq!(result.error.map(|e| e.kind), Some(kind), "{}", expression);
        }
    }

    #[test]
    fn test_configured_step_budget() {
        let config = EngineConfig::default().with_max_steps(50);
        let evaluator = Evaluator::new(Dialect::Code).with_config(config);
        let result = evaluator.evaluate("let i = 0\nwhile (i < 1000) { i++ }\nreturn i", &Bindings::new());
        assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::EvaluationError));

        let unbounded = Evaluator::new(Dialect::Code);
        let result = unbounded.evaluate("let i = 0\nwhile (i < 1000) { i++ }\nreturn i", &Bindings::new());
        assert_eq!(result.value, Some(Value::Number(1000.0)));
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let expression = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        let result = evaluate(&expression, &Bindings::new());
        assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::SyntaxError));
    }

    #[test]
    fn test_long_operator_chains_are_syntax_errors() {
        let bindings = bindings(&[("x", 1.0)]);
        for operator in [" + ", " * ", " && ", " || ", " == ", " < "] {
            let expression = vec!["x"; 5_000].join(operator);
            let result = evaluate(&expression, &bindings);
            assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::SyntaxError), "{}", operator);

            let validation = analyze(&expression, &bindings, true);
            assert!(!validation.all_valid);
            assert!(validation.valid_variables.is_empty());
        }

        let huge = vec!["1"; 200_000].join(" + ");
        assert_eq!(
            analyze(&huge, &Bindings::new(), true).errors[0].kind,
            ErrorKind::SyntaxError
        );
    }

    #[test]
    fn test_chains_within_the_limit_still_evaluate() {
        let bindings = bindings(&[("x", 1.0)]);
        let expression = vec!["x"; 100].join(" + ");
        assert_eq!(evaluate(&expression, &bindings).value, Some(Value::Number(100.0)));
    }

    #[test]
    fn test_long_postfix_chains_are_syntax_errors() {
        let record: Value = serde_json::from_str(r#"{ "b": { "b": null }, "list": [[1]] }"#).unwrap();
        let bindings = bindings(&[("a", record)]);
        let chains = [
            format!("a{}", ".b".repeat(5_000)),
            format!("a.list{}", "[0]".repeat(5_000)),
            format!("a{}", "()".repeat(5_000)),
            format!("Math.max{}", "(1)".repeat(5_000)),
        ];
        for chain in &chains {
            let result = evaluate(chain, &bindings);
            assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::SyntaxError));
        }
        assert_eq!(
            evaluate("a.b.b", &bindings).value,
            Some(Value::Null)
        );
    }

    #[test]
    fn test_very_long_input_is_handled() {
        let text = "x".repeat(1_000_000);
        let result = evaluate(&format!("'{}'.length", text), &Bindings::new());
        assert_eq!(result.value, Some(Value::Number(1_000_000.0)));

        let name = "n".repeat(100_000);
        let result = evaluate(&name, &Bindings::new());
        assert_eq!(result.error.map(|e| e.kind), Some(ErrorKind::MissingVariable));

        let statements = "total += 1\n".repeat(20_000);
        let code = format!("let total = 0\n{}return total", statements);
        assert_eq!(evaluate_code(&code, &Bindings::new()).value, Some(Value::Number(20_000.0)));
    }

    #[test]
    fn test_results_format_for_display() {
        let bindings = payroll_bindings();
        let display = |expression: &str| format_value_for_display(evaluate(expression, &bindings).value.as_ref());
        assert_eq!(display("salary * (1 - taxRate) + bonus"), "4750");
        assert_eq!(display("salary / 3"), "1666.67");
        assert_eq!(display("salary > bonus"), "True");
        assert_eq!(display("missing"), "N/A");
    }
}
