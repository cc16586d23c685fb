//! Graph construction and topological ordering.
//!
//! # Ordering Semantics
//!
//! - In-degree counts edges, not distinct parents: two edges from the same
//!   parent give an in-degree of 2.
//! - Kahn's queue is seeded with in-degree-0 nodes in declaration order.
//! - Children are released in edge order, newly-ready nodes are appended in
//!   discovery order.
//! - Any node left unsorted means a cycle; the run is rejected as a whole.

use crate::domain::connection::{Edge, NodeId};
use crate::domain::error::StrategraphError;
use crate::domain::node::Node;
use std::collections::{HashMap, VecDeque};

/// One incoming edge of a node, as seen from the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub source: NodeId,
    pub source_port: String,
    pub target_port: String,
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, Vec<ParentLink>>,
}

impl Graph {
    /// Build the adjacency maps. Duplicate node ids keep their first
    /// declaration; edges naming an unknown node are dropped.
    pub fn build(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut kept: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                tracing::warn!(node = %node.label, "duplicate node id, keeping first declaration");
                continue;
            }
            index.insert(node.id, kept.len());
            kept.push(node);
        }

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut parents: HashMap<NodeId, Vec<ParentLink>> = HashMap::new();
        let mut valid_edges = Vec::with_capacity(edges.len());

        for edge in edges {
            if !index.contains_key(&edge.source_node) || !index.contains_key(&edge.target_node) {
                tracing::debug!(
                    source = %edge.source_node,
                    target = %edge.target_node,
                    "dropping connection to unknown node"
                );
                continue;
            }
            children
                .entry(edge.source_node)
                .or_default()
                .push(edge.target_node);
            parents.entry(edge.target_node).or_default().push(ParentLink {
                source: edge.source_node,
                source_port: edge.source_port.clone(),
                target_port: edge.target_port.clone(),
            });
            valid_edges.push(edge);
        }

        Self {
            nodes: kept,
            index,
            edges: valid_edges,
            children,
            parents,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, id: NodeId) -> &[ParentLink] {
        self.parents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A node with no outgoing edges.
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// Kahn's algorithm. Fails with `CycleDetected` listing the label of every
    /// node that could not be scheduled, in declaration order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, StrategraphError> {
        let mut in_degree: HashMap<NodeId, usize> =
            self.nodes.iter().map(|n| (n.id, self.parents(n.id).len())).collect();

        let mut queue: VecDeque<NodeId> = self
            .nodes
            .iter()
            .filter(|n| in_degree[&n.id] == 0)
            .map(|n| n.id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for child in self.children(id) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let remaining: Vec<String> = self
                .nodes
                .iter()
                .filter(|n| in_degree[&n.id] > 0)
                .map(|n| n.label.clone())
                .collect();
            return Err(StrategraphError::CycleDetected { nodes: remaining });
        }

        Ok(order)
    }
}
