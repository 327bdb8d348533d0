//! End-to-end compile cycles against a temporary project tree: Sass in,
//! prefixed CSS out, errors routed to the notifier.

use std::fs;
use std::path::Path;

use stylesync::styles::{CycleOutcome, StylePipeline};
use stylesync_test_utils::builders::settings_under;
use stylesync_test_utils::init_tracing;
use stylesync_test_utils::notifier::{Notification, RecordingNotifier};

fn write_entry(root: &Path, content: &str) {
    let scss_dir = root.join("assets/scss");
    fs::create_dir_all(&scss_dir).unwrap();
    fs::write(scss_dir.join("main.scss"), content).unwrap();
}

fn pipeline(root: &Path) -> StylePipeline {
    let settings = settings_under("assets/scss/main.scss", "puzzle/static");
    StylePipeline::from_settings(root, &settings.styles).unwrap()
}

#[test]
fn valid_entry_produces_one_nonempty_css_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_entry(
        dir.path(),
        "$accent: #bada55;\nbody {\n  color: $accent;\n  .nested { margin: 0; }\n}\n",
    );

    let notifier = RecordingNotifier::new();
    let outcome = pipeline(dir.path()).run_cycle(&notifier).unwrap();

    let expected = dir.path().join("puzzle/static/main.css");
    match outcome {
        CycleOutcome::Written { path, bytes } => {
            assert_eq!(path, expected);
            assert!(bytes > 0);
        }
        other => panic!("expected Written, got {other:?}"),
    }

    let css = fs::read_to_string(&expected).unwrap();
    assert!(!css.is_empty());
    assert!(css.contains("#bada55"));
    assert!(css.contains("body .nested"));

    // Exactly one file in the output directory.
    let entries: Vec<_> = fs::read_dir(dir.path().join("puzzle/static"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn flexbox_output_is_vendor_prefixed_for_legacy_targets() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_entry(dir.path(), ".row {\n  display: flex;\n}\n");

    let notifier = RecordingNotifier::new();
    pipeline(dir.path()).run_cycle(&notifier).unwrap();

    let css = fs::read_to_string(dir.path().join("puzzle/static/main.css")).unwrap();
    assert!(css.contains("display: flex"));
    assert!(css.contains("-webkit-"), "missing webkit prefix in: {css}");
    assert!(css.contains("-ms-"), "missing ms prefix in: {css}");
}

#[test]
fn syntax_error_notifies_instead_of_failing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_entry(dir.path(), "body {\n  color: $undefined-variable;\n}\n");

    let notifier = RecordingNotifier::new();
    let outcome = pipeline(dir.path()).run_cycle(&notifier).unwrap();

    assert_eq!(outcome, CycleOutcome::CompileFailed);
    assert!(
        !dir.path().join("puzzle/static/main.css").exists(),
        "no output may be written on a failed cycle"
    );

    let failures = notifier.failures();
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        Notification::Failed { path, message } => {
            assert!(path.ends_with("main.scss"));
            assert!(!message.is_empty());
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn recovery_cycle_after_error_writes_output_again() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_entry(dir.path(), "body { color: $nope; }\n");

    let notifier = RecordingNotifier::new();
    let p = pipeline(dir.path());
    assert_eq!(p.run_cycle(&notifier).unwrap(), CycleOutcome::CompileFailed);

    write_entry(dir.path(), "body { color: teal; }\n");
    match p.run_cycle(&notifier).unwrap() {
        CycleOutcome::Written { .. } => {}
        other => panic!("expected Written after fix, got {other:?}"),
    }

    let notifications = notifier.notifications();
    assert_eq!(notifications.len(), 2);
    assert!(matches!(notifications[1], Notification::Updated { .. }));
}

#[test]
fn missing_entry_is_a_soft_compile_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // No entry file written at all: grass reports it as a compile error and
    // the watch session keeps going.
    let notifier = RecordingNotifier::new();
    let outcome = pipeline(dir.path()).run_cycle(&notifier).unwrap();
    assert_eq!(outcome, CycleOutcome::CompileFailed);
    assert_eq!(notifier.failures().len(), 1);
}
