use std::sync::atomic::Ordering;

use super::*;
use crate::test_support::{
    Workspace, class, diagnostic, display_cached, flush, h, server, type_check,
};

#[test]
fn test_recheck_replaces_cached_errors_exactly() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![class("a.kiln", "A", &[])]);
    let first = diagnostic("a.kiln", 1, "first");
    let second = diagnostic("a.kiln", 2, "second");
    workspace.set_diagnostics("a.kiln", vec![first.clone(), second.clone()]);

    let (state, errors) = type_check(&server, ServerState::new(), &["a.kiln"], &["a.kiln"]);
    assert_eq!(errors[&h("a.kiln")], vec![first, second]);

    let third = diagnostic("a.kiln", 5, "third");
    workspace.set_diagnostics("a.kiln", vec![third.clone()]);
    let (state, errors) = type_check(&server, state, &["a.kiln"], &["a.kiln"]);
    assert_eq!(errors[&h("a.kiln")], vec![third.clone()]);
    assert_eq!(state.errors.get(&h("a.kiln")), [third]);

    workspace.set_diagnostics("a.kiln", vec![]);
    let (state, errors) = type_check(&server, state, &[], &["a.kiln"]);
    assert!(errors[&h("a.kiln")].is_empty());
    assert_eq!(state.errors.diagnostic_count(), 0);
}

#[test]
fn test_recheck_is_idempotent() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![class("a.kiln", "A", &[])]);
    workspace.set_module("b.kiln", &["a.kiln"], vec![class("b.kiln", "B", &["A"])]);
    workspace.set_diagnostics("b.kiln", vec![diagnostic("b.kiln", 0, "b is wrong")]);

    let files = ["a.kiln", "b.kiln"];
    let (state, first) = type_check(&server, ServerState::new(), &files, &files);
    let cached = state.errors.clone();
    let (state, second) = type_check(&server, state, &files, &files);

    assert_eq!(first, second);
    assert_eq!(state.errors, cached);
    assert_eq!(state.environment.class_count(), 2);
}

#[test]
fn test_recheck_defers_dependents_until_flush() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![class("a.kiln", "Base", &[])]);
    workspace.set_module(
        "b.kiln",
        &["a.kiln"],
        vec![class("b.kiln", "Derived", &["Base"])],
    );
    let files = ["a.kiln", "b.kiln"];
    let (state, _) = type_check(&server, ServerState::new(), &files, &files);
    assert!(state.deferred.is_empty());
    workspace.clear_calls();

    workspace.set_diagnostics("b.kiln", vec![diagnostic("b.kiln", 0, "Base changed")]);
    let (state, errors) = type_check(&server, state, &["a.kiln"], &["a.kiln"]);
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec![&h("a.kiln")]);
    assert_eq!(workspace.analyzed(), vec![h("a.kiln")]);
    assert_eq!(state.deferred.len(), 1);
    assert!(state.errors.get(&h("b.kiln")).is_empty());

    let (state, errors) = flush(&server, state);
    assert!(state.deferred.is_empty());
    assert_eq!(workspace.analyzed(), vec![h("a.kiln"), h("b.kiln")]);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[&h("b.kiln")].len(), 1);
}

#[test]
fn test_dependents_already_checked_are_not_deferred() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![]);
    workspace.set_module("b.kiln", &["a.kiln"], vec![]);
    let files = ["a.kiln", "b.kiln"];
    let (state, _) = type_check(&server, ServerState::new(), &files, &files);

    let (state, _) = type_check(&server, state, &["a.kiln"], &files);
    assert!(state.deferred.is_empty());
}

#[test]
fn test_flush_terminates_on_import_cycle() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &["b.kiln"], vec![]);
    workspace.set_module("b.kiln", &["a.kiln"], vec![]);
    let files = ["a.kiln", "b.kiln"];
    let (state, _) = type_check(&server, ServerState::new(), &files, &files);
    let (state, _) = type_check(&server, state, &["a.kiln"], &["a.kiln"]);
    assert_eq!(state.deferred.len(), 1);

    let (state, errors) = flush(&server, state);
    assert!(state.deferred.is_empty());
    assert_eq!(errors.len(), 2);

    let (state, _) = flush(&server, state);
    assert!(state.deferred.is_empty());
}

#[test]
fn test_small_batches_run_sequentially() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    let files = ["1.kiln", "2.kiln", "3.kiln", "4.kiln", "5.kiln"];
    let (_, errors) = type_check(&server, ServerState::new(), &[], &files);

    assert_eq!(errors.len(), 5);
    assert_eq!(workspace.schedules(), vec![(SchedulingMode::Sequential, 5)]);
}

#[test]
fn test_large_batches_run_in_parallel() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    let files = ["1.kiln", "2.kiln", "3.kiln", "4.kiln", "5.kiln", "6.kiln"];
    for file in files {
        workspace.set_diagnostics(file, vec![diagnostic(file, 0, file)]);
    }
    let (_, errors) = type_check(&server, ServerState::new(), &[], &files);

    assert_eq!(workspace.schedules(), vec![(SchedulingMode::Parallel, 6)]);
    let order: Vec<&str> = errors.keys().map(FileHandle::as_str).collect();
    assert_eq!(order, files);
    for file in files {
        assert_eq!(errors[&h(file)][0].message_text, file);
    }
}

#[test]
fn test_duplicate_check_files_count_once() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    let (_, errors) = type_check(
        &server,
        ServerState::new(),
        &[],
        &["a.kiln", "./a.kiln", "b/../a.kiln"],
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(workspace.analyzed(), vec![h("a.kiln")]);
}

#[test]
fn test_memory_pressure_reclaims_before_recheck() {
    let workspace = Workspace::new();
    let server = server(&workspace);

    workspace.set_heap_ratio(0.3);
    let (state, _) = type_check(&server, ServerState::new(), &[], &["a.kiln"]);
    assert_eq!(workspace.reclaims.load(Ordering::SeqCst), 0);

    workspace.set_heap_ratio(0.9);
    let (state, _) = type_check(&server, state, &[], &["a.kiln"]);
    assert_eq!(workspace.reclaims.load(Ordering::SeqCst), 1);
    assert!(state.handles.contains(&h("a.kiln")));
}

#[test]
fn test_deleted_file_leaves_environment() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![class("a.kiln", "Gone", &[])]);
    let (state, _) = type_check(&server, ServerState::new(), &["a.kiln"], &["a.kiln"]);
    assert!(state.environment.contains_class("Gone"));

    workspace.remove_module("a.kiln");
    let (state, _) = type_check(&server, state, &["a.kiln"], &["a.kiln"]);
    assert!(!state.environment.contains_class("Gone"));
    assert!(!state.environment.contains_module(&h("a.kiln")));
}

#[test]
fn test_suppressions_registered_for_update_files() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.set_module("a.kiln", &[], vec![]);

    let (state, _) = type_check(&server, ServerState::new(), &[], &["a.kiln"]);
    assert!(workspace.registered.lock().unwrap().is_empty());

    type_check(&server, state, &["a.kiln"], &["a.kiln"]);
    assert_eq!(*workspace.registered.lock().unwrap(), vec![h("a.kiln")]);
}

#[test]
fn test_diagnostics_for_other_files_are_reported_under_their_file() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    let elsewhere = diagnostic("lib.kiln", 3, "raised while checking a");
    workspace.set_diagnostics("a.kiln", vec![elsewhere.clone()]);

    let (state, errors) = type_check(&server, ServerState::new(), &[], &["a.kiln"]);
    assert!(errors[&h("a.kiln")].is_empty());
    assert_eq!(errors[&h("lib.kiln")], vec![elsewhere.clone()]);

    let (_, cached) = display_cached(&server, state, &[]);
    assert_eq!(cached[&h("lib.kiln")], vec![elsewhere]);
}

#[test]
fn test_paths_outside_roots_are_ignored() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    let (state, errors) = type_check(
        &server,
        ServerState::new(),
        &["/elsewhere/a.kiln"],
        &["/elsewhere/a.kiln", "/project/b.kiln"],
    );
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec![&h("b.kiln")]);
    assert!(workspace.parsed.lock().unwrap().is_empty());
    assert_eq!(state.handles.len(), 1);
}

#[test]
fn test_analyzer_failure_fails_the_recheck() {
    let workspace = Workspace::new();
    let server = server(&workspace);
    workspace.fail_analysis_of("b.kiln");

    let request = RecheckRequest::new(vec![], vec![h("a.kiln"), h("b.kiln")]);
    let error = server.type_check(ServerState::new(), request).unwrap_err();
    assert!(format!("{error:#}").contains("failed to analyze b.kiln"));
}
