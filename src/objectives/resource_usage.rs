use super::{Objective, ObjectiveArgs};
use crate::error::Result;
use crate::mapping::Individual;
use crate::model::{ArrayModel, Application, SimParams};

/// Number of interconnect resources the candidate's routed signals occupy.
/// Counts fabric resources (ALUs and switches); `include_ports = true`
/// counts edge ports and constant registers as well.
#[derive(Debug, Default)]
pub struct ResourceUsage {
    include_ports: bool,
}

impl ResourceUsage {
    pub fn from_args(args: &ObjectiveArgs) -> Result<Self> {
        args.expect_keys(&["include_ports"])?;
        Ok(Self {
            include_ports: args.get_bool("include_ports")?.unwrap_or(false),
        })
    }
}

impl Objective for ResourceUsage {
    fn name(&self) -> &str {
        "resource_usage"
    }

    fn minimize(&self) -> bool {
        true
    }

    fn eval(
        &self,
        _model: &ArrayModel,
        _app: &Application,
        _sim: &SimParams,
        individual: &Individual,
    ) -> f64 {
        individual
            .routing_graph()
            .node_weights()
            .filter(|n| self.include_ports || n.is_alu() || n.is_switch())
            .count() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteNode;
    use crate::types::Mapping;

    #[test]
    fn test_counts_fabric_and_optionally_ports() {
        let model = ArrayModel::new(2, 2, 0).expect("model");
        let app = Application::from_json_str(
            r#"{"nodes": [{"name": "a", "kind": "op"}], "edges": []}"#,
        )
        .expect("parse");
        let sim = SimParams::default();

        let mut ind = Individual::new(Mapping::new(), None);
        let g = ind.routing_graph_mut();
        g.add_node(RouteNode::Alu { x: 0, y: 0 });
        g.add_node(RouteNode::Switch { x: 0, y: 0 });
        g.add_node(RouteNode::InPort { y: 0 });

        let fabric_only = ResourceUsage {
            include_ports: false,
        };
        let with_ports = ResourceUsage {
            include_ports: true,
        };
        assert_eq!(fabric_only.eval(&model, &app, &sim, &ind), 2.0);
        assert_eq!(with_ports.eval(&model, &app, &sim, &ind), 3.0);
    }

    #[test]
    fn test_argument_parsing() {
        let table: toml::value::Table = toml::from_str("include_ports = true").expect("toml");
        let obj = ResourceUsage::from_args(&ObjectiveArgs::from_table(table)).expect("args");
        assert!(obj.include_ports);

        let bad: toml::value::Table = toml::from_str("portz = true").expect("toml");
        assert!(ResourceUsage::from_args(&ObjectiveArgs::from_table(bad)).is_err());
    }
}
