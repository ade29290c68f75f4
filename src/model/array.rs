use crate::error::{CgramapError, Result};
use crate::types::Coord;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A routing resource in the array interconnect.
///
/// The interconnect is a directed, weighted graph over these resources;
/// routers search it for paths and copy the ones they commit to into a
/// candidate's routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RouteNode {
    /// Functional unit at a grid cell.
    Alu { x: u32, y: u32 },
    /// Switching element at a grid cell.
    Switch { x: u32, y: u32 },
    /// Constant register feeding row `y` from the west edge.
    ConstReg { y: u32 },
    /// Data input port on the west edge of row `y`.
    InPort { y: u32 },
    /// Data output port on the east edge of row `y`.
    OutPort { y: u32 },
}

impl RouteNode {
    /// Grid column of the resource, if it occupies a cell.
    pub fn x(&self) -> Option<u32> {
        match self {
            RouteNode::Alu { x, .. } | RouteNode::Switch { x, .. } => Some(*x),
            _ => None,
        }
    }

    pub fn is_alu(&self) -> bool {
        matches!(self, RouteNode::Alu { .. })
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, RouteNode::Switch { .. })
    }
}

impl fmt::Display for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteNode::Alu { x, y } => write!(f, "ALU({x},{y})"),
            RouteNode::Switch { x, y } => write!(f, "SE({x},{y})"),
            RouteNode::ConstReg { y } => write!(f, "CONST({y})"),
            RouteNode::InPort { y } => write!(f, "IN({y})"),
            RouteNode::OutPort { y } => write!(f, "OUT({y})"),
        }
    }
}

/// Hardware model of the CGRA: grid geometry, per-cell resources, and the
/// weighted interconnect network routers search over.
///
/// Topology: every cell holds one ALU and one switching element. The SE
/// feeds the local ALU and its four grid neighbours; constant registers and
/// input ports enter on the west edge, output ports leave on the east edge.
#[derive(Debug, Clone)]
pub struct ArrayModel {
    width: u32,
    height: u32,
    preg_count: u32,
    network: DiGraph<RouteNode, f64>,
    resource_index: HashMap<RouteNode, NodeIndex>,
}

impl ArrayModel {
    pub fn new(width: u32, height: u32, preg_count: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CgramapError::Configuration(format!(
                "array size must be nonzero, got {width}x{height}"
            )));
        }

        let mut network = DiGraph::new();
        let mut resource_index = HashMap::new();
        let add = |g: &mut DiGraph<RouteNode, f64>,
                       idx: &mut HashMap<RouteNode, NodeIndex>,
                       r: RouteNode| {
            let n = g.add_node(r);
            idx.insert(r, n);
            n
        };

        for y in 0..height {
            for x in 0..width {
                add(&mut network, &mut resource_index, RouteNode::Alu { x, y });
                add(&mut network, &mut resource_index, RouteNode::Switch { x, y });
            }
            add(&mut network, &mut resource_index, RouteNode::ConstReg { y });
            add(&mut network, &mut resource_index, RouteNode::InPort { y });
            add(&mut network, &mut resource_index, RouteNode::OutPort { y });
        }

        let idx = |r: RouteNode| resource_index[&r];
        for y in 0..height {
            for x in 0..width {
                let se = idx(RouteNode::Switch { x, y });
                let alu = idx(RouteNode::Alu { x, y });
                network.add_edge(se, alu, 0.0);
                network.add_edge(alu, se, 0.0);

                if x + 1 < width {
                    let east = idx(RouteNode::Switch { x: x + 1, y });
                    network.add_edge(se, east, 1.0);
                    network.add_edge(east, se, 1.0);
                }
                if y + 1 < height {
                    let south = idx(RouteNode::Switch { x, y: y + 1 });
                    network.add_edge(se, south, 1.0);
                    network.add_edge(south, se, 1.0);
                }
            }

            let west = idx(RouteNode::Switch { x: 0, y });
            let east = idx(RouteNode::Switch { x: width - 1, y });
            network.add_edge(idx(RouteNode::ConstReg { y }), west, 0.0);
            network.add_edge(idx(RouteNode::InPort { y }), west, 0.0);
            network.add_edge(east, idx(RouteNode::OutPort { y }), 0.0);
        }

        Ok(Self {
            width,
            height,
            preg_count,
            network,
            resource_index,
        })
    }

    /// Grid size as (width, height).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pipeline-register stages between rows; zero means the
    /// array has no pipeline structure.
    pub fn preg_count(&self) -> u32 {
        self.preg_count
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    pub fn alu_at(&self, coord: Coord) -> RouteNode {
        RouteNode::Alu {
            x: coord.x,
            y: coord.y,
        }
    }

    pub fn network(&self) -> &DiGraph<RouteNode, f64> {
        &self.network
    }

    pub fn resource_index(&self, resource: RouteNode) -> Option<NodeIndex> {
        self.resource_index.get(&resource).copied()
    }

    /// Rewrite interconnect edge weights: switch-to-switch hops get
    /// `switch_weight`, every other link (ALU taps, edge ports) gets
    /// `link_weight`. Routers call this once at setup.
    pub fn set_network_weights(&mut self, switch_weight: f64, link_weight: f64) {
        let edges: Vec<_> = self.network.edge_indices().collect();
        for edge in edges {
            if let Some((a, b)) = self.network.edge_endpoints(edge) {
                let w = if self.network[a].is_switch() && self.network[b].is_switch() {
                    switch_weight
                } else {
                    link_weight
                };
                self.network[edge] = w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(ArrayModel::new(0, 4, 0).is_err());
        assert!(ArrayModel::new(4, 0, 0).is_err());
    }

    #[test]
    fn test_network_shape() {
        let model = ArrayModel::new(2, 2, 0).expect("model");
        // 2 resources per cell plus 3 edge resources per row.
        assert_eq!(model.network().node_count(), 2 * 2 * 2 + 2 * 3);
        assert!(model
            .resource_index(RouteNode::Switch { x: 1, y: 1 })
            .is_some());
        assert!(model.resource_index(RouteNode::Switch { x: 2, y: 0 }).is_none());
    }

    #[test]
    fn test_weight_rewrite() {
        let mut model = ArrayModel::new(2, 1, 0).expect("model");
        model.set_network_weights(3.0, 0.5);
        let se0 = model.resource_index(RouteNode::Switch { x: 0, y: 0 }).unwrap();
        let se1 = model.resource_index(RouteNode::Switch { x: 1, y: 0 }).unwrap();
        let hop = model.network().find_edge(se0, se1).unwrap();
        assert_eq!(model.network()[hop], 3.0);
        let alu = model.resource_index(RouteNode::Alu { x: 0, y: 0 }).unwrap();
        let tap = model.network().find_edge(se0, alu).unwrap();
        assert_eq!(model.network()[tap], 0.5);
    }
}
