//! Signal routing over the array interconnect.
//!
//! Routers are capability collaborators: the evaluation pipeline drives them
//! stage by stage and only looks at the returned costs. A router writes the
//! paths it commits to into the candidate's routing graph; objectives read
//! that graph afterwards.

pub mod astar;

pub use astar::AstarRouter;

use crate::model::{ArrayModel, RouteNode, SubGraph};
use crate::types::Mapping;
use petgraph::stable_graph::StableDiGraph;

/// Per-candidate routing graph: the subset of interconnect resources a
/// candidate's signals occupy, with the edge weights they were routed at.
pub type RoutingGraph = StableDiGraph<RouteNode, f64>;

/// Routing capability.
///
/// Stage methods return the accumulated cost of the paths they attempted;
/// unroutable connections contribute `penalty_cost()` instead of failing.
/// The pipeline compares running totals against `penalty_cost()` to abort
/// hopeless candidates early.
pub trait Router: Send + Sync {
    /// Install this router's preferred edge weights on the interconnect.
    /// Called once at setup, before any routing.
    fn set_default_weights(&self, model: &mut ArrayModel);

    /// Cost stand-in for an unroutable connection, and the budget routing
    /// stages are measured against.
    fn penalty_cost(&self) -> f64;

    /// Route op-to-op data edges between mapped cells.
    fn route_computation(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64;

    /// Route constant-register feeds to their consumers.
    fn route_constants(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64;

    /// Route input-port feeds to their consumers.
    fn route_inputs(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
    ) -> f64;

    /// Route producer ops to output ports. When the candidate carries a
    /// pipeline-register assignment it is passed along; active registers
    /// downstream of a producer add drain cost to its path.
    fn route_outputs(
        &self,
        model: &ArrayModel,
        sub: &SubGraph,
        mapping: &Mapping,
        graph: &mut RoutingGraph,
        pregs: Option<&[bool]>,
    ) -> f64;

    /// Drop routing-graph nodes no committed path touches.
    fn clean_graph(&self, graph: &mut RoutingGraph);
}
