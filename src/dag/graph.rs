// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::registry::TaskSpec;
use crate::engine::TaskName;
use crate::errors::{Result, StylesyncError};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Direct prerequisites: tasks that must complete before this one.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that list this one in their `after`.
    dependents: Vec<TaskName>,
}

/// In-memory DAG representation keyed by task name.
///
/// Acyclicity is checked once by [`validate_specs`] at startup; afterwards
/// the graph only keeps adjacency information for scheduling and diagnostics.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
    /// Registration order, used for stable iteration and tie-breaking.
    order: Vec<TaskName>,
}

impl DagGraph {
    /// Build a DAG from validated task specs.
    pub fn from_specs(specs: &[TaskSpec]) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = HashMap::new();
        let mut order = Vec::with_capacity(specs.len());

        for spec in specs {
            order.push(spec.name.clone());
            nodes.insert(
                spec.name.clone(),
                DagNode {
                    deps: spec.after.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        for spec in specs {
            for dep in &spec.after {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(spec.name.clone());
                }
            }
        }

        Self { nodes, order }
    }

    /// All task names in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// The target plus its transitive prerequisites, in execution order
    /// (prerequisites before dependents, registration order as tie-break).
    pub fn requirement_closure(&self, target: &str) -> Vec<TaskName> {
        let mut members: HashSet<&str> = HashSet::new();
        let mut stack = vec![target];
        while let Some(name) = stack.pop() {
            if members.insert(name) {
                for dep in self.dependencies_of(name) {
                    stack.push(dep.as_str());
                }
            }
        }

        let mut out = Vec::with_capacity(members.len());
        let mut remaining: Vec<&str> = self
            .order
            .iter()
            .map(|s| s.as_str())
            .filter(|n| members.contains(n))
            .collect();

        // Kahn-style peel in registration order; validated graphs always
        // drain completely.
        while !remaining.is_empty() {
            let before = remaining.len();
            remaining.retain(|name| {
                let ready = self
                    .dependencies_of(name)
                    .iter()
                    .all(|d| !members.contains(d.as_str()) || out.contains(d));
                if ready {
                    out.push(name.to_string());
                }
                !ready
            });
            if remaining.len() == before {
                break;
            }
        }

        out
    }
}

/// Validate task specs: unique names, known and non-self `after` references,
/// and an acyclic graph.
pub fn validate_specs(specs: &[TaskSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(StylesyncError::ConfigError(format!(
                "duplicate task name '{}'",
                spec.name
            )));
        }
    }

    for spec in specs {
        for dep in &spec.after {
            if !seen.contains(dep.as_str()) {
                return Err(StylesyncError::ConfigError(format!(
                    "task '{}' has unknown prerequisite '{}' in `after`",
                    spec.name, dep
                )));
            }
            if dep == &spec.name {
                return Err(StylesyncError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    spec.name
                )));
            }
        }
    }

    // Edge direction: dep -> task. A topological sort fails iff there is a
    // cycle.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for spec in specs {
        graph.add_node(spec.name.as_str());
    }
    for spec in specs {
        for dep in &spec.after {
            graph.add_edge(dep.as_str(), spec.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(StylesyncError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::registry::{builtin_tasks, TaskKind, TaskSpec};
    use crate::config::Settings;

    fn spec(name: &str, after: &[&str]) -> TaskSpec {
        TaskSpec::new(name, TaskKind::Aggregate).after(after)
    }

    #[test]
    fn builtin_specs_validate() {
        let specs = builtin_tasks(&Settings::default());
        validate_specs(&specs).unwrap();
    }

    #[test]
    fn closure_orders_prerequisites_first() {
        let specs = builtin_tasks(&Settings::default());
        let graph = DagGraph::from_specs(&specs);

        let order = graph.requirement_closure("default");
        assert_eq!(order.len(), 4);
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("compile-styles") < pos("dev-server"));
        assert!(pos("dev-server") < pos("default"));
        assert!(pos("watch-styles") < pos("default"));
    }

    #[test]
    fn closure_excludes_unrelated_tasks() {
        let specs = builtin_tasks(&Settings::default());
        let graph = DagGraph::from_specs(&specs);

        let order = graph.requirement_closure("compile-styles");
        assert_eq!(order, vec!["compile-styles".to_string()]);
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let specs = vec![spec("a", &["nope"])];
        assert!(validate_specs(&specs).is_err());
    }

    #[test]
    fn self_dependency_is_rejected() {
        let specs = vec![spec("a", &["a"])];
        assert!(validate_specs(&specs).is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let specs = vec![spec("a", &["b"]), spec("b", &["a"])];
        match validate_specs(&specs) {
            Err(StylesyncError::DagCycle(_)) => {}
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }
}
