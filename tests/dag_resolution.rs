//! Task graph validation and topological resolution of the built-in tasks.

use stylesync::config::Settings;
use stylesync::dag::graph::validate_specs;
use stylesync::dag::registry::{
    builtin_tasks, COMPILE_STYLES, DEFAULT, DEV_SERVER, WATCH_STYLES,
};
use stylesync::dag::{DagGraph, TaskKind};
use stylesync::errors::StylesyncError;
use stylesync_test_utils::builders::TaskSpecBuilder;

#[test]
fn builtin_registry_is_a_valid_dag() {
    let specs = builtin_tasks(&Settings::default());
    validate_specs(&specs).unwrap();
}

#[test]
fn default_closure_contains_all_four_tasks_in_order() {
    let specs = builtin_tasks(&Settings::default());
    let graph = DagGraph::from_specs(&specs);

    let order = graph.requirement_closure(DEFAULT);
    assert_eq!(order.len(), 4);

    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos(COMPILE_STYLES) < pos(DEV_SERVER));
    assert!(pos(DEV_SERVER) < pos(DEFAULT));
    assert!(pos(WATCH_STYLES) < pos(DEFAULT));
}

#[test]
fn dev_server_closure_pulls_in_the_compile_task_only() {
    let specs = builtin_tasks(&Settings::default());
    let graph = DagGraph::from_specs(&specs);

    let order = graph.requirement_closure(DEV_SERVER);
    assert_eq!(
        order,
        vec![COMPILE_STYLES.to_string(), DEV_SERVER.to_string()]
    );
}

#[test]
fn watch_binding_points_at_the_compile_task() {
    let settings = Settings::default();
    let specs = builtin_tasks(&settings);

    let watch = specs.iter().find(|s| s.name == WATCH_STYLES).unwrap();
    let binding = watch.watch.as_ref().unwrap();
    assert_eq!(binding.triggers, COMPILE_STYLES);
    assert_eq!(binding.patterns, settings.styles.watch);
}

#[test]
fn cycles_are_reported_as_dag_errors() {
    let specs = vec![
        TaskSpecBuilder::new("a").after("b").build(),
        TaskSpecBuilder::new("b").after("c").build(),
        TaskSpecBuilder::new("c").after("a").build(),
    ];

    match validate_specs(&specs) {
        Err(StylesyncError::DagCycle(msg)) => assert!(msg.contains("cycle")),
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn unknown_and_duplicate_names_are_config_errors() {
    let unknown = vec![TaskSpecBuilder::new("a").after("ghost").build()];
    assert!(matches!(
        validate_specs(&unknown),
        Err(StylesyncError::ConfigError(_))
    ));

    let duplicate = vec![
        TaskSpecBuilder::new("a").build(),
        TaskSpecBuilder::new("a").build(),
    ];
    assert!(matches!(
        validate_specs(&duplicate),
        Err(StylesyncError::ConfigError(_))
    ));
}

#[test]
fn service_kinds_are_exactly_the_long_lived_tasks() {
    let specs = builtin_tasks(&Settings::default());
    let services: Vec<_> = specs
        .iter()
        .filter(|s| s.kind.is_service())
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(services, vec![DEV_SERVER, WATCH_STYLES]);
    assert_eq!(
        specs.iter().find(|s| s.name == DEFAULT).unwrap().kind,
        TaskKind::Aggregate
    );
}
