/// The complete, canonical definition of a payroll flow, ready to run.
/// This is the target structure for any custom data model conversion.
#[derive(Debug, Clone, Default)]
pub struct FlowDefinition {
    pub nodes: Vec<FlowNodeDefinition>,
    pub edges: Vec<FlowEdgeDefinition>,
}

/// Defines a single node of the flow.
#[derive(Debug, Clone)]
pub struct FlowNodeDefinition {
    pub id: String,
    pub kind: NodeKind,
}

impl FlowNodeDefinition {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// What a node does when the flow reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Publishes the listed employee fields, or every field when the list is empty.
    Employee { fields: Vec<String> },
    /// A formula whose value is published as `result_variable`.
    Computation {
        expression: String,
        result_variable: String,
    },
    /// A boolean condition. Outgoing edges are taken by handle `"true"` or `"false"`.
    Condition { condition: String },
    /// A code body whose returned value is published as `result_variable`.
    Code {
        code: String,
        result_variable: String,
    },
    /// Copies the binding `source` into the output record under `field`.
    Output { field: String, source: String },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Employee { .. } => "employee",
            NodeKind::Computation { .. } => "computation",
            NodeKind::Condition { .. } => "condition",
            NodeKind::Code { .. } => "code",
            NodeKind::Output { .. } => "output",
        }
    }

    /// The variable this node publishes downstream, if any.
    pub fn result_variable(&self) -> Option<&str> {
        match self {
            NodeKind::Computation {
                result_variable, ..
            }
            | NodeKind::Code {
                result_variable, ..
            } => Some(result_variable),
            _ => None,
        }
    }
}

/// Defines a connection between two nodes of the flow.
#[derive(Debug, Clone)]
pub struct FlowEdgeDefinition {
    pub source: String,
    pub source_handle: String,
    pub target: String,
}

impl FlowEdgeDefinition {
    /// A plain connection leaving through the default `"out"` handle.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_handle(source, "out", target)
    }

    /// A connection leaving `source` through a named handle, e.g. a condition branch.
    pub fn with_handle(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
        }
    }
}
