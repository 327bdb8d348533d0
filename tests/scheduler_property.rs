//! Property test: for arbitrary acyclic task graphs, the resolved execution
//! order always places prerequisites before their dependents.

use proptest::prelude::*;

use stylesync::dag::graph::validate_specs;
use stylesync::dag::{DagGraph, TaskKind, TaskSpec};

/// Generate an acyclic spec list: task `i` may only depend on tasks `< i`.
fn arb_specs() -> impl Strategy<Value = Vec<TaskSpec>> {
    (2usize..10)
        .prop_flat_map(|n| {
            let deps = proptest::collection::vec(
                proptest::collection::vec(0usize..n, 0..3),
                n,
            );
            (Just(n), deps)
        })
        .prop_map(|(n, deps)| {
            (0..n)
                .map(|i| {
                    let mut spec = TaskSpec::new(format!("task-{i}"), TaskKind::Aggregate);
                    let mut after: Vec<String> = deps[i]
                        .iter()
                        .filter(|&&d| d < i)
                        .map(|d| format!("task-{d}"))
                        .collect();
                    after.sort();
                    after.dedup();
                    spec.after = after;
                    spec
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn closure_order_respects_every_edge(specs in arb_specs()) {
        prop_assert!(validate_specs(&specs).is_ok());
        let graph = DagGraph::from_specs(&specs);

        for spec in &specs {
            let order = graph.requirement_closure(&spec.name);

            // The target is always last-or-later than its prerequisites,
            // and every transitive prerequisite is present.
            let pos = |name: &str| order.iter().position(|n| n == name);
            let target_pos = pos(&spec.name).expect("target in own closure");

            for dep in &spec.after {
                let dep_pos = pos(dep).expect("direct prerequisite in closure");
                prop_assert!(dep_pos < target_pos, "{dep} must precede {}", spec.name);
            }

            // Each member's own prerequisites are ordered too.
            for member in &order {
                let member_pos = pos(member).unwrap();
                for dep in graph.dependencies_of(member) {
                    let dep_pos = pos(dep).expect("transitive prerequisite in closure");
                    prop_assert!(dep_pos < member_pos, "{dep} must precede {member}");
                }
            }
        }
    }
}
