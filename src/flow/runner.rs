use super::definition::{FlowDefinition, NodeKind};
use super::node::{NodeOutcome, NodeStatus, SkipReason, evaluate_node};
use crate::ast::{Bindings, Value};
use crate::config::EngineConfig;
use crate::error::FlowError;
use crate::variables::{BindingLayers, GlobalRegistry, check_variable_name};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Everything a flow run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReport {
    /// One outcome per node, in execution order.
    pub outcomes: Vec<NodeOutcome>,
    /// Globals, then employee fields, then every published result.
    pub bindings: Bindings,
    /// Values written by output nodes.
    pub output: BTreeMap<String, Value>,
}

impl FlowReport {
    pub fn outcome(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| o.node_id == node_id)
    }

    pub fn failed(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == NodeStatus::Failed)
    }
}

pub struct FlowRunnerBuilder {
    flow: FlowDefinition,
    config: EngineConfig,
    globals: GlobalRegistry,
}

impl FlowRunnerBuilder {
    pub fn new(flow: FlowDefinition) -> Self {
        Self {
            flow,
            config: EngineConfig::default(),
            globals: GlobalRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_globals(mut self, globals: GlobalRegistry) -> Self {
        self.globals = globals;
        self
    }

    pub fn build(self) -> FlowRunner {
        FlowRunner {
            flow: self.flow,
            config: self.config,
            globals: self.globals,
        }
    }
}

/// Evaluates a flow for one employee record.
///
/// The runner holds no results between calls: every `run` resolves the graph
/// and evaluates every node again from scratch.
pub struct FlowRunner {
    flow: FlowDefinition,
    config: EngineConfig,
    globals: GlobalRegistry,
}

impl FlowRunner {
    pub fn builder(flow: FlowDefinition) -> FlowRunnerBuilder {
        FlowRunnerBuilder::new(flow)
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn globals(&self) -> &GlobalRegistry {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut GlobalRegistry {
        &mut self.globals
    }

    /// Node ids in the order they run.
    pub fn resolve_order(&self) -> Result<Vec<&str>, FlowError> {
        let graph = Graph::resolve(&self.flow)?;
        Ok(graph
            .order
            .iter()
            .map(|&i| self.flow.nodes[i].id.as_str())
            .collect())
    }

    /// Runs every node in dependency order against `employee`.
    ///
    /// Only graph-level problems are errors. Problems inside a node are
    /// reported on that node's outcome, and nodes downstream of it are skipped.
    #[instrument(skip_all, fields(nodes = self.flow.nodes.len()))]
    pub fn run(&self, employee: &BTreeMap<String, Value>) -> Result<FlowReport, FlowError> {
        self.check_result_variables()?;
        let graph = Graph::resolve(&self.flow)?;
        debug!(
            order = ?graph.order.iter().map(|&i| &self.flow.nodes[i].id).collect_vec(),
            "resolved flow order"
        );

        let globals = self.globals.to_bindings();
        let mut outcomes: Vec<Option<NodeOutcome>> = vec![None; self.flow.nodes.len()];
        let mut published = BindingLayers::new(globals.clone());
        let mut output = BTreeMap::new();

        for &index in &graph.order {
            let node = &self.flow.nodes[index];
            if let Some(reason) = self.skip_reason(&graph, index, &outcomes) {
                debug!(node = %node.id, ?reason, "skipping flow node");
                outcomes[index] = Some(NodeOutcome::skipped(&node.id, reason));
                continue;
            }

            let mut layers = BindingLayers::new(globals.clone());
            for ancestor in graph.ancestors(index) {
                if let Some(outcome) = &outcomes[ancestor] {
                    publish(&mut layers, &self.flow.nodes[ancestor].kind, outcome);
                }
            }
            let bindings = layers.merge();

            let outcome = evaluate_node(node, &bindings, employee, &self.config);
            match outcome.status {
                NodeStatus::Evaluated => {
                    publish(&mut published, &node.kind, &outcome);
                    if let (NodeKind::Output { field, .. }, Some(value)) = (&node.kind, outcome.value()) {
                        output.insert(field.clone(), value.clone());
                    }
                }
                _ => warn!(
                    node = %node.id,
                    error = ?outcome.error().map(|e| e.to_string()),
                    "flow node failed"
                ),
            }
            outcomes[index] = Some(outcome);
        }

        Ok(FlowReport {
            outcomes: graph
                .order
                .iter()
                .filter_map(|&i| outcomes[i].take())
                .collect(),
            bindings: published.merge(),
            output,
        })
    }

    fn check_result_variables(&self) -> Result<(), FlowError> {
        for node in &self.flow.nodes {
            if let Some(name) = node.kind.result_variable() {
                check_variable_name(name).map_err(|message| FlowError::InvalidResultVariable {
                    node_id: node.id.clone(),
                    message,
                })?;
            }
        }
        Ok(())
    }

    /// `None` when the node should run: it has no inputs, or at least one active input.
    fn skip_reason(
        &self,
        graph: &Graph,
        index: usize,
        outcomes: &[Option<NodeOutcome>],
    ) -> Option<SkipReason> {
        let mut reasons = Vec::new();
        for &edge_index in &graph.incoming[index] {
            let edge = &self.flow.edges[edge_index];
            let Some(&source) = graph.index.get(edge.source.as_str()) else {
                continue;
            };
            let Some(outcome) = &outcomes[source] else {
                continue;
            };
            let source_id = &self.flow.nodes[source].id;
            match &outcome.status {
                NodeStatus::Evaluated => match (&self.flow.nodes[source].kind, outcome.value()) {
                    (NodeKind::Condition { .. }, Some(Value::Bool(taken))) => {
                        if edge.source_handle == taken.to_string() {
                            return None;
                        }
                        reasons.push(SkipReason::BranchNotTaken {
                            condition: source_id.clone(),
                        });
                    }
                    _ => return None,
                },
                NodeStatus::Failed => reasons.push(SkipReason::UpstreamFailed {
                    node_id: source_id.clone(),
                }),
                NodeStatus::Skipped(reason) => reasons.push(reason.clone()),
            }
        }
        if reasons.is_empty() {
            return None;
        }
        let failure = reasons
            .iter()
            .position(|r| matches!(r, SkipReason::UpstreamFailed { .. }));
        Some(reasons.swap_remove(failure.unwrap_or(0)))
    }
}

/// Adds what an evaluated node publishes to the layers.
fn publish(layers: &mut BindingLayers, kind: &NodeKind, outcome: &NodeOutcome) {
    let Some(value) = outcome.value() else {
        return;
    };
    match (kind, value) {
        (NodeKind::Employee { .. }, Value::Record(fields)) => {
            for (name, value) in fields {
                layers.add_employee_field(name.clone(), value.clone());
            }
        }
        (NodeKind::Computation { result_variable, .. } | NodeKind::Code { result_variable, .. }, _) => {
            layers.push_computed(result_variable.clone(), value.clone());
        }
        _ => {}
    }
}

/// The resolved shape of a flow: node lookup, incoming edges and a topological order.
struct Graph<'f> {
    index: AHashMap<&'f str, usize>,
    incoming: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    order: Vec<usize>,
    rank: Vec<usize>,
}

impl<'f> Graph<'f> {
    /// Kahn's algorithm. Among ready nodes, the one declared first runs first.
    fn resolve(flow: &'f FlowDefinition) -> Result<Self, FlowError> {
        let n = flow.nodes.len();
        let mut index = AHashMap::with_capacity(n);
        for (i, node) in flow.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(FlowError::DuplicateNode(node.id.clone()));
            }
        }

        let mut incoming = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];
        let mut successors = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for (edge_index, edge) in flow.edges.iter().enumerate() {
            let source = *index
                .get(edge.source.as_str())
                .ok_or_else(|| FlowError::NodeNotFound {
                    missing_node_id: edge.source.clone(),
                    source_node_id: edge.target.clone(),
                })?;
            let target = *index
                .get(edge.target.as_str())
                .ok_or_else(|| FlowError::NodeNotFound {
                    missing_node_id: edge.target.clone(),
                    source_node_id: edge.source.clone(),
                })?;
            incoming[target].push(edge_index);
            predecessors[target].push(source);
            successors[source].push(target);
            in_degree[target] += 1;
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &next in &successors[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        if let Some(stuck) = (0..n).find(|&i| in_degree[i] > 0) {
            return Err(FlowError::Cycle(flow.nodes[stuck].id.clone()));
        }

        let mut rank = vec![0; n];
        for (position, &i) in order.iter().enumerate() {
            rank[i] = position;
        }
        Ok(Self {
            index,
            incoming,
            predecessors,
            order,
            rank,
        })
    }

    /// Every transitive predecessor of `node`, in execution order.
    fn ancestors(&self, node: usize) -> Vec<usize> {
        let mut seen = BTreeSet::new();
        let mut stack = self.predecessors[node].clone();
        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                stack.extend(&self.predecessors[current]);
            }
        }
        seen.into_iter().sorted_by_key(|&i| self.rank[i]).collect()
    }
}
