use super::{Latency, MappingWidth, Objective, ObjectiveArgs, ResourceUsage, RoutingCost};
use crate::error::{CgramapError, Result};
use crate::routing::{AstarRouter, Router};
use std::collections::HashMap;
use std::sync::Arc;

type ObjectiveCtor = fn(&ObjectiveArgs) -> Result<Arc<dyn Objective>>;
type RouterCtor = fn() -> Arc<dyn Router>;

/// Name-to-constructor table for objectives. Identifiers come from the run
/// configuration; an unknown one is a capability error, not a configuration
/// error, so callers can tell a typo in a key apart from asking for a
/// scorer this build does not ship.
pub struct ObjectiveRegistry {
    ctors: HashMap<String, ObjectiveCtor>,
}

impl ObjectiveRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            ctors: HashMap::new(),
        };
        registry.register("mapping_width", |args| {
            Ok(Arc::new(MappingWidth::from_args(args)?))
        });
        registry.register("latency", |args| Ok(Arc::new(Latency::from_args(args)?)));
        registry.register("resource_usage", |args| {
            Ok(Arc::new(ResourceUsage::from_args(args)?))
        });
        registry.register("routing_cost", |args| {
            Ok(Arc::new(RoutingCost::from_args(args)?))
        });
        registry
    }

    pub fn register(&mut self, name: &str, ctor: ObjectiveCtor) {
        self.ctors.insert(name.to_string(), ctor);
    }

    pub fn build(&self, name: &str, args: &ObjectiveArgs) -> Result<Arc<dyn Objective>> {
        match self.ctors.get(name) {
            Some(ctor) => ctor(args),
            None => Err(CgramapError::Capability(format!(
                "unknown objective '{name}'"
            ))),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ObjectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Name-to-constructor table for routers.
pub struct RouterRegistry {
    ctors: HashMap<String, RouterCtor>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            ctors: HashMap::new(),
        };
        registry.register("astar", || Arc::new(AstarRouter::new()));
        registry
    }

    pub fn register(&mut self, name: &str, ctor: RouterCtor) {
        self.ctors.insert(name.to_string(), ctor);
    }

    pub fn build(&self, name: &str) -> Result<Arc<dyn Router>> {
        match self.ctors.get(name) {
            Some(ctor) => Ok(ctor()),
            None => Err(CgramapError::Capability(format!("unknown router '{name}'"))),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ctors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RouterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
