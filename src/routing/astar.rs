use super::{Router, RoutingGraph};
use crate::model::{ArrayModel, RouteNode, SubGraph};
use crate::types::Mapping;
use petgraph::algo::astar;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Cost added to an output path per active pipeline register downstream of
/// its producer's row.
const PREG_DRAIN_COST: f64 = 2.0;

const DEFAULT_PENALTY: f64 = 1000.0;

/// Shortest-path reference router. Each connection is routed independently
/// over the interconnect with A*; committed paths accumulate in the
/// candidate's routing graph, and connections with no path charge the
/// penalty instead.
#[derive(Debug, Clone)]
pub struct AstarRouter {
    penalty: f64,
}

impl Default for AstarRouter {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
        }
    }
}

impl AstarRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_penalty(penalty: f64) -> Self {
        Self { penalty }
    }

    fn route_one(
        &self,
        model: &ArrayModel,
        source: RouteNode,
        target: RouteNode,
        graph: &mut RoutingGraph,
    ) -> f64 {
        let network = model.network();
        let (s, t) = match (model.resource_index(source), model.resource_index(target)) {
            (Some(s), Some(t)) => (s, t),
            _ => return self.penalty,
        };
        match astar(network, s, |n| n == t, |e| *e.weight(), |_| 0.0) {
            Some((cost, path)) => {
                commit_path(graph, network, &path);
                cost
            }
            None => self.penalty,
        }
    }
}

impl Router for AstarRouter {
    fn set_default_weights(&self, model: &mut ArrayModel) {
        // unit cost per switch hop, free taps and edge links
        model.set_network_weights(1.0, 0.0);
    }

    fn penalty_cost(&self) -> f64 {
        self.penalty
    }

    fn route_computation(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64 {
        let mut total = 0.0;
        for &(src, dst) in sub.edges() {
            total += match (mapping.get(&src), mapping.get(&dst)) {
                (Some(&a), Some(&b)) => {
                    self.route_one(model, model.alu_at(a), model.alu_at(b), graph)
                }
                _ => self.penalty,
            };
        }
        total
    }

    fn route_constants(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64 {
        let mut total = 0.0;
        for &(_, dst) in sub.edges() {
            total += match mapping.get(&dst) {
                Some(&cell) => self.route_one(
                    model,
                    RouteNode::ConstReg { y: cell.y },
                    model.alu_at(cell),
                    graph,
                ),
                None => self.penalty,
            };
        }
        total
    }

    fn route_inputs(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64 {
        let mut total = 0.0;
        for &(_, dst) in sub.edges() {
            total += match mapping.get(&dst) {
                Some(&cell) => self.route_one(
                    model,
                    RouteNode::InPort { y: cell.y },
                    model.alu_at(cell),
                    graph,
                ),
                None => self.penalty,
            };
        }
        total
    }

    fn route_outputs(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
        pregs: Option<&[bool]>,
    ) -> f64 {
        let mut total = 0.0;
        for &(src, _) in sub.edges() {
            total += match mapping.get(&src) {
                Some(&cell) => {
                    let path = self.route_one(
                        model,
                        model.alu_at(cell),
                        RouteNode::OutPort { y: cell.y },
                        graph,
                    );
                    let drain = pregs
                        .map(|bits| {
                            bits.iter().skip(cell.y as usize).filter(|&&b| b).count() as f64
                                * PREG_DRAIN_COST
                        })
                        .unwrap_or(0.0);
                    path + drain
                }
                None => self.penalty,
            };
        }
        total
    }

    fn clean_graph(&self, graph: &mut RoutingGraph) {
        graph.retain_nodes(|g, n| g.neighbors_undirected(n).next().is_some());
    }
}

/// Copy a found path into the candidate's routing graph, reusing nodes and
/// edges earlier paths already committed.
fn commit_path(
    graph: &mut RoutingGraph,
    network: &DiGraph<RouteNode, f64>,
    path: &[petgraph::graph::NodeIndex],
) {
    let mut present: HashMap<RouteNode, petgraph::graph::NodeIndex> =
        graph.node_indices().map(|i| (graph[i], i)).collect();
    for pair in path.windows(2) {
        let (a, b) = (network[pair[0]], network[pair[1]]);
        let na = *present.entry(a).or_insert_with(|| graph.add_node(a));
        let nb = *present.entry(b).or_insert_with(|| graph.add_node(b));
        if graph.find_edge(na, nb).is_none() {
            let w = network
                .find_edge(pair[0], pair[1])
                .map(|e| network[e])
                .unwrap_or(0.0);
            graph.add_edge(na, nb, w);
        }
    }
}
