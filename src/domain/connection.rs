//! Connection normalization.
//!
//! Strategy editors emit connections in three dialects:
//!
//! - `{"from": {"nodeId", "port"}, "to": {"nodeId", "port"}}`
//! - `{"source", "target", "sourcePort"|"sourceHandle", "targetPort"|"targetHandle"}`
//! - `{"sourceNode", "targetNode", "sourcePort", "targetPort"}`
//!
//! All three collapse into one canonical [`Edge`]. Nothing downstream of this
//! module ever sees the raw shapes.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;

pub const DEFAULT_SOURCE_PORT: &str = "value";
pub const DEFAULT_TARGET_PORT: &str = "input";

/// Normalized node identifier.
///
/// Integer ids and numeric strings keep their value; any other string is
/// hashed into the negative range. Hash collisions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    /// Stable id for an opaque string. Identical across processes.
    pub fn from_opaque(raw: &str) -> Self {
        let digest = blake3::hash(raw.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        let h = u64::from_le_bytes(bytes) >> 1;
        NodeId(-(h as i64) - 1)
    }
}

/// Normalize a JSON node id. Returns `None` for ids that are neither numbers
/// nor strings.
pub fn normalize_node_id(raw: &JsonValue) -> Option<NodeId> {
    match raw {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(NodeId(i))
            } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15) {
                Some(NodeId(f as i64))
            } else {
                Some(NodeId::from_opaque(&n.to_string()))
            }
        }
        JsonValue::String(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(i) => Some(NodeId(i)),
                Err(_) => Some(NodeId::from_opaque(trimmed)),
            }
        }
        _ => None,
    }
}

/// Canonical directed edge between two node ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source_node: NodeId,
    pub source_port: String,
    pub target_node: NodeId,
    pub target_port: String,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(rename = "nodeId")]
    node_id: JsonValue,
    #[serde(default)]
    port: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConnection {
    Nested {
        from: Endpoint,
        to: Endpoint,
    },
    Flow {
        source: JsonValue,
        target: JsonValue,
        #[serde(default, rename = "sourcePort")]
        source_port: Option<String>,
        #[serde(default, rename = "sourceHandle")]
        source_handle: Option<String>,
        #[serde(default, rename = "targetPort")]
        target_port: Option<String>,
        #[serde(default, rename = "targetHandle")]
        target_handle: Option<String>,
    },
    Explicit {
        #[serde(rename = "sourceNode")]
        source_node: JsonValue,
        #[serde(rename = "targetNode")]
        target_node: JsonValue,
        #[serde(default, rename = "sourcePort")]
        source_port: Option<String>,
        #[serde(default, rename = "targetPort")]
        target_port: Option<String>,
    },
}

fn port_or(port: Option<String>, default: &str) -> String {
    match port {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => default.to_string(),
    }
}

fn make_edge(
    source: &JsonValue,
    source_port: Option<String>,
    target: &JsonValue,
    target_port: Option<String>,
) -> Option<Edge> {
    Some(Edge {
        source_node: normalize_node_id(source)?,
        source_port: port_or(source_port, DEFAULT_SOURCE_PORT),
        target_node: normalize_node_id(target)?,
        target_port: port_or(target_port, DEFAULT_TARGET_PORT),
    })
}

/// Normalize one connection record. Records that match none of the dialects
/// yield `None`.
pub fn normalize_connection(raw: &JsonValue) -> Option<Edge> {
    let parsed: RawConnection = serde_json::from_value(raw.clone()).ok()?;
    match parsed {
        RawConnection::Nested { from, to } => {
            make_edge(&from.node_id, from.port, &to.node_id, to.port)
        }
        RawConnection::Flow {
            source,
            target,
            source_port,
            source_handle,
            target_port,
            target_handle,
        } => make_edge(
            &source,
            source_port.or(source_handle),
            &target,
            target_port.or(target_handle),
        ),
        RawConnection::Explicit {
            source_node,
            target_node,
            source_port,
            target_port,
        } => make_edge(&source_node, source_port, &target_node, target_port),
    }
}

/// Normalize every record, dropping the ones that cannot be read.
pub fn normalize_connections(raw: &[JsonValue]) -> Vec<Edge> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let edge = normalize_connection(record);
            if edge.is_none() {
                tracing::debug!(index = i, "dropping unreadable connection record");
            }
            edge
        })
        .collect()
}
