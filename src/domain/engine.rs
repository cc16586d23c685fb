//! Strategy graph engine.
//!
//! [`StrategyGraph::build`] normalizes connections, builds the graph and
//! sorts it once. [`StrategyGraph::evaluate`] then runs one topological pass
//! against a market snapshot. Every call starts from fresh scratch state, so
//! a graph can be evaluated once per live tick or thousands of times in a
//! backtest with identical results for identical input.

use crate::domain::connection::{normalize_connections, NodeId};
use crate::domain::context::{ContextEvent, SignalContext};
use crate::domain::direction::{Direction, DirectionRules};
use crate::domain::error::StrategraphError;
use crate::domain::executor::execute;
use crate::domain::graph::Graph;
use crate::domain::inputs::{Inputs, PortMap};
use crate::domain::market::MarketData;
use crate::domain::node::{Node, NodeSpec};
use crate::domain::resolver::resolve;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A strategy document: nodes plus connections in any supported shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default, alias = "edges")]
    pub connections: Vec<JsonValue>,
}

impl StrategyDefinition {
    /// Parses a strategy document. Well-formed JSON of the wrong shape is a
    /// [`StrategraphError::GraphParse`]; anything else is a JSON error.
    pub fn from_json(raw: &str) -> Result<Self, StrategraphError> {
        serde_json::from_str(raw).map_err(|e| match e.classify() {
            Category::Data => StrategraphError::GraphParse {
                reason: e.to_string(),
            },
            _ => StrategraphError::Json(e),
        })
    }
}

/// Per-run diagnostics, keyed by node label so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebugInfo {
    pub node_outputs: BTreeMap<String, PortMap>,
    pub execution_order: Vec<String>,
    pub final_condition: bool,
    pub signal_direction: Option<Direction>,
    pub decided_by: Option<String>,
    pub context: SignalContext,
    pub nodes_count: usize,
    pub connections_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub signal: Option<Direction>,
    pub debug: DebugInfo,
}

#[derive(Debug, Clone)]
pub struct StrategyGraph {
    graph: Graph,
    order: Vec<NodeId>,
    rules: DirectionRules,
}

impl StrategyGraph {
    /// Fails only on a cycle. Nodes with unusable ids and connections that
    /// match no known shape are dropped.
    pub fn build(def: &StrategyDefinition) -> Result<Self, StrategraphError> {
        Self::sort(assemble(def))
    }

    fn sort(graph: Graph) -> Result<Self, StrategraphError> {
        let order = graph.topological_order()?;
        tracing::debug!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            "strategy graph built"
        );

        Ok(Self {
            graph,
            order,
            rules: DirectionRules::default(),
        })
    }

    pub fn with_direction_rules(mut self, rules: DirectionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn node_count(&self) -> usize {
        self.graph.nodes().len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edges().len()
    }

    /// Node labels in execution order.
    pub fn execution_order(&self) -> Vec<String> {
        self.order.iter().map(|id| self.label(*id)).collect()
    }

    fn label(&self, id: NodeId) -> String {
        self.graph
            .node(id)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn evaluate(&self, market: &MarketData) -> Evaluation {
        let mut outputs: HashMap<NodeId, PortMap> = HashMap::with_capacity(self.order.len());
        let mut events: Vec<ContextEvent> = Vec::new();

        for id in &self.order {
            let Some(node) = self.graph.node(*id) else {
                continue;
            };
            let inputs = Inputs::resolve(self.graph.parents(*id), &outputs);
            let result = execute(&node.kind, inputs, market);
            tracing::trace!(
                node = %node.label,
                kind = node.kind.tag(),
                outputs = ?result.outputs,
                "node executed"
            );
            events.extend(result.events);
            outputs.insert(*id, result.outputs);
        }

        let ctx = SignalContext::fold(&events);
        let resolution = resolve(&self.graph, &self.order, &outputs, &ctx, &self.rules);

        let node_outputs = outputs
            .into_iter()
            .map(|(id, ports)| (self.label(id), ports))
            .collect();

        Evaluation {
            signal: resolution.direction,
            debug: DebugInfo {
                node_outputs,
                execution_order: self.execution_order(),
                final_condition: resolution.fired(),
                signal_direction: resolution.direction,
                decided_by: resolution.decided_by.map(|id| self.label(id)),
                context: ctx,
                nodes_count: self.node_count(),
                connections_count: self.edge_count(),
                error: None,
            },
        }
    }
}

/// Parses nodes and connections into a graph, dropping nodes with unusable
/// or duplicate ids and connections that match no known shape.
fn assemble(def: &StrategyDefinition) -> Graph {
    let nodes: Vec<Node> = def
        .nodes
        .iter()
        .filter_map(|spec| {
            let node = Node::from_spec(spec);
            if node.is_none() {
                tracing::warn!(id = %spec.id, node_type = %spec.node_type, "dropping node with unusable id");
            }
            node
        })
        .collect();
    Graph::build(nodes, normalize_connections(&def.connections))
}

/// Build and evaluate in one call. Never fails: a build error is reported
/// in `DebugInfo::error` with no signal.
pub fn run_strategy(
    def: &StrategyDefinition,
    market: &MarketData,
    rules: &DirectionRules,
) -> (Option<Direction>, DebugInfo) {
    let graph = assemble(def);
    let (nodes_count, connections_count) = (graph.nodes().len(), graph.edges().len());
    match StrategyGraph::sort(graph) {
        Ok(graph) => {
            let eval = graph.with_direction_rules(rules.clone()).evaluate(market);
            (eval.signal, eval.debug)
        }
        Err(e) => {
            tracing::warn!(error = %e, "strategy rejected");
            let debug = DebugInfo {
                nodes_count,
                connections_count,
                error: Some(e.to_string()),
                ..DebugInfo::default()
            };
            (None, debug)
        }
    }
}
