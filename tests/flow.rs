//! End-to-end flow runs: ordering, branching, failure propagation and graph errors.
mod common;
use common::*;
use keisan::flow::SkipReason;
use keisan::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn run(flow: FlowDefinition, salary: f64) -> FlowReport {
    FlowRunner::builder(flow)
        .with_globals(payroll_globals())
        .build()
        .run(&employee(salary))
        .expect("flow should resolve")
}

fn status<'r>(report: &'r FlowReport, id: &str) -> &'r NodeStatus {
    &report.outcome(id).expect("node has an outcome").status
}

#[cfg(test)]
mod flow_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_true_branch_is_taken() {
        let report = run(create_branching_flow(), 5000.0);

        assert_eq!(report.output, BTreeMap::from([("net".to_string(), Value::Number(3750.0))]));
        assert_eq!(status(&report, "taxed"), &NodeStatus::Evaluated);
        assert_eq!(
            status(&report, "boosted"),
            &NodeStatus::Skipped(SkipReason::BranchNotTaken {
                condition: "high".to_string()
            })
        );
        assert!(report.failed().next().is_none());
    }

    #[test]
    fn test_false_branch_is_taken() {
        let report = run(create_branching_flow(), 3000.0);

        assert_eq!(report.output["net"], Value::Number(4000.0));
        assert!(matches!(status(&report, "taxed"), NodeStatus::Skipped(_)));
        assert_eq!(report.bindings["netSalary"], Value::Number(4000.0));
    }

    #[test]
    fn test_execution_follows_dependencies_then_declaration_order() {
        let flow = FlowDefinition {
            nodes: vec![
                output("out", "total", "total"),
                computation("total", "base + extra", "total"),
                computation("base", "salary", "base"),
                computation("extra", "bonus", "extra"),
                FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec![] }),
            ],
            edges: vec![
                FlowEdgeDefinition::new("employee", "base"),
                FlowEdgeDefinition::new("base", "total"),
                FlowEdgeDefinition::new("extra", "total"),
                FlowEdgeDefinition::new("total", "out"),
            ],
        };
        let runner = FlowRunner::builder(flow).with_globals(payroll_globals()).build();

        assert_eq!(
            runner.resolve_order().unwrap(),
            vec!["extra", "employee", "base", "total", "out"]
        );
        let report = runner.run(&employee(5000.0)).unwrap();
        let order: Vec<_> = report.outcomes.iter().map(|o| o.node_id.as_str()).collect();
        assert_eq!(order, vec!["extra", "employee", "base", "total", "out"]);
        assert_eq!(report.output["total"], Value::Number(6000.0));
    }

    #[test]
    fn test_failed_node_skips_everything_downstream() {
        let flow = FlowDefinition {
            nodes: vec![
                FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec![] }),
                computation("gross", "salary * overtimeRate", "gross"),
                computation("net", "gross * (1 - taxRate)", "net"),
                output("out", "net", "net"),
            ],
            edges: vec![
                FlowEdgeDefinition::new("employee", "gross"),
                FlowEdgeDefinition::new("gross", "net"),
                FlowEdgeDefinition::new("net", "out"),
            ],
        };
        let report = run(flow, 5000.0);

        let gross = report.outcome("gross").unwrap();
        assert_eq!(gross.status, NodeStatus::Failed);
        assert_eq!(gross.error().map(|e| e.kind), Some(ErrorKind::MissingVariable));
        assert_eq!(
            gross.validation.as_ref().and_then(|v| v.is_bound("overtimeRate")),
            Some(false)
        );
        for id in ["net", "out"] {
            assert_eq!(
                status(&report, id),
                &NodeStatus::Skipped(SkipReason::UpstreamFailed {
                    node_id: "gross".to_string()
                })
            );
        }
        assert!(report.output.is_empty());
        assert!(!report.bindings.contains_key("gross"));
    }

    #[test]
    fn test_runtime_error_fails_the_node() {
        let flow = FlowDefinition {
            nodes: vec![computation("ratio", "bonus / (taxRate - 0.25)", "ratio")],
            edges: vec![],
        };
        let report = run(flow, 5000.0);
        let outcome = report.outcome("ratio").unwrap();
        assert_eq!(outcome.status, NodeStatus::Failed);
        assert_eq!(outcome.error().map(|e| e.kind), Some(ErrorKind::EvaluationError));
    }

    #[test]
    fn test_later_layers_shadow_earlier_ones() {
        let flow = FlowDefinition {
            nodes: vec![
                FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec![] }),
                computation("seen", "bonus", "seenBonus"),
                computation("override", "bonus * 2", "bonus"),
                computation("after", "bonus", "afterBonus"),
            ],
            edges: vec![
                FlowEdgeDefinition::new("employee", "seen"),
                FlowEdgeDefinition::new("seen", "override"),
                FlowEdgeDefinition::new("override", "after"),
            ],
        };
        let mut record = employee(5000.0);
        record.insert("bonus".to_string(), Value::Number(50.0));
        let report = FlowRunner::builder(flow)
            .with_globals(payroll_globals())
            .build()
            .run(&record)
            .unwrap();

        assert_eq!(report.outcome("seen").unwrap().value(), Some(&Value::Number(50.0)));
        assert_eq!(report.outcome("after").unwrap().value(), Some(&Value::Number(100.0)));
        assert_eq!(report.bindings["bonus"], Value::Number(100.0));
    }

    #[test]
    fn test_unconnected_nodes_see_only_globals() {
        let flow = FlowDefinition {
            nodes: vec![
                FlowNodeDefinition::new("employee", NodeKind::Employee { fields: vec![] }),
                computation("lonely", "salary + bonus", "lonely"),
            ],
            edges: vec![],
        };
        let report = run(flow, 5000.0);
        let lonely = report.outcome("lonely").unwrap();
        assert_eq!(lonely.status, NodeStatus::Failed);
        assert_eq!(lonely.error().and_then(|e| e.identifier.as_deref()), Some("salary"));
    }

    #[test]
    fn test_employee_node_with_unknown_field_fails() {
        let flow = FlowDefinition {
            nodes: vec![FlowNodeDefinition::new(
                "employee",
                NodeKind::Employee {
                    fields: vec!["salary".into(), "department".into()],
                },
            )],
            edges: vec![],
        };
        let report = run(flow, 5000.0);
        let outcome = report.outcome("employee").unwrap();
        assert_eq!(outcome.status, NodeStatus::Failed);
        assert_eq!(outcome.error().map(|e| e.kind), Some(ErrorKind::MissingVariable));
    }

    #[test]
    fn test_non_boolean_condition_fails() {
        let flow = FlowDefinition {
            nodes: vec![FlowNodeDefinition::new(
                "check",
                NodeKind::Condition {
                    condition: "bonus".to_string(),
                },
            )],
            edges: vec![],
        };
        let report = run(flow, 5000.0);
        assert_eq!(
            report.outcome("check").unwrap().error().map(|e| e.kind),
            Some(ErrorKind::TypeError)
        );
    }

    #[test]
    fn test_edges_route_by_source_handle_only() {
        let mut flow = create_branching_flow();
        flow.edges = flow
            .edges
            .into_iter()
            .map(|edge| FlowEdgeDefinition {
                source: edge.source,
                source_handle: edge.source_handle,
                target: edge.target,
            })
            .collect();
        let report = run(flow, 3000.0);
        assert_eq!(report.output["net"], Value::Number(4000.0));
        assert_eq!(status(&report, "boosted"), &NodeStatus::Evaluated);
    }

    #[test]
    fn test_graph_errors() {
        let cycle = FlowDefinition {
            nodes: vec![computation("a", "1", "a"), computation("b", "2", "b")],
            edges: vec![FlowEdgeDefinition::new("a", "b"), FlowEdgeDefinition::new("b", "a")],
        };
        assert!(matches!(
            FlowRunner::builder(cycle).build().run(&BTreeMap::new()),
            Err(FlowError::Cycle(_))
        ));

        let duplicate = FlowDefinition {
            nodes: vec![computation("a", "1", "a"), computation("a", "2", "b")],
            edges: vec![],
        };
        assert_eq!(
            FlowRunner::builder(duplicate).build().run(&BTreeMap::new()).unwrap_err(),
            FlowError::DuplicateNode("a".to_string())
        );

        let dangling = FlowDefinition {
            nodes: vec![computation("a", "1", "a")],
            edges: vec![FlowEdgeDefinition::new("a", "ghost")],
        };
        assert!(matches!(
            FlowRunner::builder(dangling).build().run(&BTreeMap::new()),
            Err(FlowError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_result_variable_is_rejected() {
        let flow = FlowDefinition {
            nodes: vec![computation("a", "1", "net-salary")],
            edges: vec![],
        };
        let error = FlowRunner::builder(flow).build().run(&BTreeMap::new()).unwrap_err();
        assert!(matches!(error, FlowError::InvalidResultVariable { ref node_id, .. } if node_id == "a"));
    }

    #[test]
    fn test_report_serializes_for_the_ui() {
        let report = run(create_branching_flow(), 5000.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["output"]["net"], serde_json::json!(3750.0));
        assert_eq!(json["outcomes"][0]["nodeId"], serde_json::json!("employee"));
    }
}
