//! Final signal resolution.
//!
//! Nodes are inspected in execution order, in three tiers:
//!
//! 1. `signal` nodes whose `signal` port is true. A configured direction is
//!    authoritative; an untyped signal node infers one.
//! 2. `output` nodes whose `result` port is true; direction inferred.
//! 3. terminal nodes (no outgoing edges, not signal/output) whose first
//!    present port among `result`, `signal`, `value` is true; direction
//!    inferred.
//!
//! A signal or output node that never received an input published `false`,
//! so it can never fire.

use crate::domain::connection::NodeId;
use crate::domain::context::SignalContext;
use crate::domain::direction::{Direction, DirectionRules};
use crate::domain::graph::Graph;
use crate::domain::inputs::PortMap;
use crate::domain::node::NodeKind;
use crate::domain::value::Signal;
use std::collections::HashMap;

const TERMINAL_PORTS: [&str; 3] = ["result", "signal", "value"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// The node that decided the run, if any fired.
    pub decided_by: Option<NodeId>,
    pub direction: Option<Direction>,
}

impl Resolution {
    pub fn fired(&self) -> bool {
        self.direction.is_some()
    }
}

pub fn resolve(
    graph: &Graph,
    order: &[NodeId],
    outputs: &HashMap<NodeId, PortMap>,
    ctx: &SignalContext,
    rules: &DirectionRules,
) -> Resolution {
    let port_true = |id: &NodeId, port: &str| {
        Signal::coerce(outputs.get(id).and_then(|ports| ports.get(port))).is_true()
    };
    let kind_of = |id: &NodeId| graph.node(*id).map(|n| &n.kind);

    for id in order {
        if let Some(NodeKind::Signal { direction }) = kind_of(id) {
            if port_true(id, "signal") {
                return Resolution {
                    decided_by: Some(*id),
                    direction: Some(direction.unwrap_or_else(|| rules.infer(ctx))),
                };
            }
        }
    }

    for id in order {
        if matches!(kind_of(id), Some(NodeKind::Output)) && port_true(id, "result") {
            return Resolution {
                decided_by: Some(*id),
                direction: Some(rules.infer(ctx)),
            };
        }
    }

    for id in order {
        if matches!(
            kind_of(id),
            Some(NodeKind::Signal { .. } | NodeKind::Output) | None
        ) || !graph.is_terminal(*id)
        {
            continue;
        }
        let fired = Signal::coerce(
            outputs
                .get(id)
                .and_then(|ports| TERMINAL_PORTS.iter().find_map(|p| ports.get(*p))),
        )
        .is_true();
        if fired {
            return Resolution {
                decided_by: Some(*id),
                direction: Some(rules.infer(ctx)),
            };
        }
    }

    Resolution {
        decided_by: None,
        direction: None,
    }
}
