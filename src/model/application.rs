use crate::error::{CgramapError, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Role of a node in the application dataflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Computation placed on an ALU.
    Op,
    /// Compile-time constant, served from a constant register.
    Const,
    /// Stream input entering through a west-edge port.
    Input,
    /// Stream output leaving through an east-edge port.
    Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNode {
    pub name: String,
    pub kind: OpKind,
}

/// One stage's slice of the dataflow graph: the edges a single routing
/// stage is responsible for, as (source, target) pairs into the app graph.
#[derive(Debug, Clone, Default)]
pub struct SubGraph {
    edges: Vec<(NodeIndex, NodeIndex)>,
}

impl SubGraph {
    pub fn edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }
}

#[derive(Debug, Deserialize)]
struct RawApp {
    #[serde(default)]
    name: Option<String>,
    nodes: Vec<AppNode>,
    edges: Vec<(String, String)>,
}

/// Application dataflow graph, decomposed at load time into the four views
/// the routing stages consume: op-to-op data edges, constant feeds, input
/// feeds, and output drains.
#[derive(Debug, Clone)]
pub struct Application {
    name: String,
    graph: DiGraph<AppNode, ()>,
    op_nodes: Vec<NodeIndex>,
    computation: SubGraph,
    constants: SubGraph,
    inputs: SubGraph,
    outputs: SubGraph,
    op_levels: Vec<Vec<NodeIndex>>,
}

impl Application {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawApp = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn from_raw(raw: RawApp) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut by_name: HashMap<String, NodeIndex> = HashMap::new();

        for node in raw.nodes {
            if by_name.contains_key(&node.name) {
                return Err(CgramapError::Application(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
            let name = node.name.clone();
            let idx = graph.add_node(node);
            by_name.insert(name, idx);
        }

        let mut computation = SubGraph::default();
        let mut constants = SubGraph::default();
        let mut inputs = SubGraph::default();
        let mut outputs = SubGraph::default();

        for (src, dst) in raw.edges {
            let (&s, &d) = match (by_name.get(&src), by_name.get(&dst)) {
                (Some(s), Some(d)) => (s, d),
                _ => {
                    return Err(CgramapError::Application(format!(
                        "edge ({src} -> {dst}) references an unknown node"
                    )))
                }
            };
            graph.add_edge(s, d, ());
            match (graph[s].kind, graph[d].kind) {
                (OpKind::Op, OpKind::Op) => computation.edges.push((s, d)),
                (OpKind::Const, OpKind::Op) => constants.edges.push((s, d)),
                (OpKind::Input, OpKind::Op) => inputs.edges.push((s, d)),
                (OpKind::Op, OpKind::Output) => outputs.edges.push((s, d)),
                (sk, dk) => {
                    return Err(CgramapError::Application(format!(
                        "edge ({src} -> {dst}) connects {sk:?} to {dk:?}, which no stage routes"
                    )))
                }
            }
        }

        let op_nodes: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&n| graph[n].kind == OpKind::Op)
            .collect();
        if op_nodes.is_empty() {
            return Err(CgramapError::Application(
                "application has no computation nodes".into(),
            ));
        }

        if toposort(&graph, None).is_err() {
            return Err(CgramapError::Application(
                "application graph contains a cycle".into(),
            ));
        }

        let op_levels = Self::compute_levels(&graph, &op_nodes);

        Ok(Self {
            name: raw.name.unwrap_or_else(|| "app".into()),
            graph,
            op_nodes,
            computation,
            constants,
            inputs,
            outputs,
            op_levels,
        })
    }

    /// Longest-path depth of each op over op-to-op edges only; feeds the
    /// topological placement strategy. Level 0 holds ops with no op
    /// predecessors.
    fn compute_levels(graph: &DiGraph<AppNode, ()>, op_nodes: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
        let mut level: HashMap<NodeIndex, usize> = HashMap::new();
        // node indices are not in topological order; iterate to a fixed point
        let mut changed = true;
        while changed {
            changed = false;
            for &n in op_nodes {
                let depth = graph
                    .neighbors_directed(n, Direction::Incoming)
                    .filter(|&p| graph[p].kind == OpKind::Op)
                    .map(|p| level.get(&p).copied().unwrap_or(0) + 1)
                    .max()
                    .unwrap_or(0);
                if level.get(&n).copied().unwrap_or(usize::MAX) != depth {
                    level.insert(n, depth);
                    changed = true;
                }
            }
        }

        let max_level = level.values().copied().max().unwrap_or(0);
        let mut levels = vec![Vec::new(); max_level + 1];
        for &n in op_nodes {
            levels[level[&n]].push(n);
        }
        levels
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &DiGraph<AppNode, ()> {
        &self.graph
    }

    pub fn node(&self, idx: NodeIndex) -> &AppNode {
        &self.graph[idx]
    }

    /// Computation nodes, the only nodes a mapping assigns to cells.
    pub fn op_nodes(&self) -> &[NodeIndex] {
        &self.op_nodes
    }

    pub fn op_count(&self) -> usize {
        self.op_nodes.len()
    }

    pub fn computation(&self) -> &SubGraph {
        &self.computation
    }

    pub fn constants(&self) -> &SubGraph {
        &self.constants
    }

    pub fn inputs(&self) -> &SubGraph {
        &self.inputs
    }

    pub fn outputs(&self) -> &SubGraph {
        &self.outputs
    }

    pub fn op_levels(&self) -> &[Vec<NodeIndex>] {
        &self.op_levels
    }
}
