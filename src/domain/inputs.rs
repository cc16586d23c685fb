//! Input resolution.
//!
//! For every incoming edge the source node's outputs are searched in a fixed
//! order: the exact source port, then `value`, `result`, `signal`, and finally
//! `close` when the target port is a price input. The first hit wins. A port
//! that finds nothing stays *absent*, which is not the same as `Null`.

use crate::domain::connection::NodeId;
use crate::domain::graph::ParentLink;
use crate::domain::value::{Signal, Value};
use std::collections::{BTreeMap, HashMap};

pub type PortMap = BTreeMap<String, Value>;

const FALLBACK_PORTS: [&str; 3] = ["value", "result", "signal"];
const PRICE_TARGETS: [&str; 3] = ["price", "prices", "input"];

/// Look up one edge's value on the source node's ports.
pub fn lookup_port<'a>(ports: &'a PortMap, source_port: &str, target_port: &str) -> Option<&'a Value> {
    if let Some(v) = ports.get(source_port) {
        return Some(v);
    }
    if let Some(v) = FALLBACK_PORTS.iter().find_map(|p| ports.get(*p)) {
        return Some(v);
    }
    if PRICE_TARGETS.contains(&target_port) {
        return ports.get("close");
    }
    None
}

/// Resolved inputs of one node, in edge order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    entries: Vec<(String, Value)>,
}

impl Inputs {
    /// Collect inputs for a node. Outputs of every parent must already be
    /// present; topological order guarantees it.
    pub fn resolve(links: &[ParentLink], outputs: &HashMap<NodeId, PortMap>) -> Self {
        let mut inputs = Inputs::default();
        for link in links {
            if inputs.get(&link.target_port).is_some() {
                continue;
            }
            let found = outputs
                .get(&link.source)
                .and_then(|ports| lookup_port(ports, &link.source_port, &link.target_port));
            if let Some(value) = found {
                inputs.entries.push((link.target_port.clone(), value.clone()));
            }
        }
        inputs
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut inputs = Inputs::default();
        for (port, value) in pairs {
            let port = port.into();
            if inputs.get(&port).is_none() {
                inputs.entries.push((port, value));
            }
        }
        inputs
    }

    pub fn get(&self, port: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == port)
            .map(|(_, value)| value)
    }

    /// First present port among `ports`.
    pub fn first_of(&self, ports: &[&str]) -> Option<&Value> {
        ports.iter().find_map(|p| self.get(p))
    }

    /// `(port, value)` pairs, in edge order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(port, value)| (port.as_str(), value))
    }

    /// All present values, in edge order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn first(&self) -> Option<&Value> {
        self.entries.first().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn signal(&self, port: &str) -> Signal {
        Signal::coerce(self.get(port))
    }

    /// Signal of the first present port among `ports`.
    pub fn signal_of(&self, ports: &[&str]) -> Signal {
        Signal::coerce(self.first_of(ports))
    }

    /// Signal of the first input in edge order.
    pub fn leading_signal(&self) -> Signal {
        Signal::coerce(self.first())
    }

    /// Every present input as a signal, in edge order.
    pub fn signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.values().map(|v| Signal::coerce(Some(v)))
    }

    pub fn number(&self, ports: &[&str]) -> Option<f64> {
        self.first_of(ports).and_then(Value::as_number)
    }

    pub fn into_port_map(self) -> PortMap {
        self.entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(pairs: &[(&str, Value)]) -> PortMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn link(source: i64, source_port: &str, target_port: &str) -> ParentLink {
        ParentLink {
            source: NodeId(source),
            source_port: source_port.into(),
            target_port: target_port.into(),
        }
    }

    #[test]
    fn exact_port_wins() {
        let p = ports(&[("histogram", Value::Number(0.5)), ("value", Value::Number(2.0))]);
        assert_eq!(lookup_port(&p, "histogram", "a"), Some(&Value::Number(0.5)));
    }

    #[test]
    fn fallback_chain_order() {
        let p = ports(&[("signal", Value::Bool(true)), ("result", Value::Bool(false))]);
        assert_eq!(lookup_port(&p, "missing", "a"), Some(&Value::Bool(false)));

        let only_signal = ports(&[("signal", Value::Bool(true))]);
        assert_eq!(lookup_port(&only_signal, "missing", "a"), Some(&Value::Bool(true)));
    }

    #[test]
    fn close_only_for_price_targets() {
        let p = ports(&[("close", Value::Number(101.0))]);
        assert_eq!(lookup_port(&p, "missing", "prices"), Some(&Value::Number(101.0)));
        assert_eq!(lookup_port(&p, "missing", "input"), Some(&Value::Number(101.0)));
        assert_eq!(lookup_port(&p, "missing", "a"), None);
    }

    #[test]
    fn resolve_first_edge_per_port_wins() {
        let mut outputs = HashMap::new();
        outputs.insert(NodeId(1), ports(&[("value", Value::Number(1.0))]));
        outputs.insert(NodeId(2), ports(&[("value", Value::Number(2.0))]));

        let inputs = Inputs::resolve(&[link(1, "value", "a"), link(2, "value", "a")], &outputs);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs.get("a"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn unresolvable_edge_leaves_port_absent() {
        let mut outputs = HashMap::new();
        outputs.insert(NodeId(1), ports(&[("upper", Value::Number(3.0))]));

        let inputs = Inputs::resolve(&[link(1, "lower", "a")], &outputs);
        assert!(inputs.is_empty());
        assert_eq!(inputs.signal("a"), Signal::Unset);
    }

    #[test]
    fn absent_differs_from_null() {
        let mut outputs = HashMap::new();
        outputs.insert(NodeId(1), ports(&[("value", Value::Null)]));

        let inputs = Inputs::resolve(&[link(1, "value", "a")], &outputs);
        assert_eq!(inputs.get("a"), Some(&Value::Null));
        assert_eq!(inputs.signal("a"), Signal::False);
        assert_eq!(inputs.signal("b"), Signal::Unset);
    }

    #[test]
    fn later_edge_fills_empty_port() {
        let mut outputs = HashMap::new();
        outputs.insert(NodeId(1), ports(&[("upper", Value::Number(3.0))]));
        outputs.insert(NodeId(2), ports(&[("value", Value::Number(4.0))]));

        let inputs = Inputs::resolve(&[link(1, "lower", "a"), link(2, "value", "a")], &outputs);
        assert_eq!(inputs.get("a"), Some(&Value::Number(4.0)));
    }
}
