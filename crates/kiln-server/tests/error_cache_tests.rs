use super::*;
use crate::test_support::{diagnostic, h};

#[test]
fn test_build_file_error_map_covers_base_population() {
    let d = diagnostic("f1.kiln", 1, "bad");
    let map = build_file_error_map(&[h("f1.kiln"), h("f2.kiln")], vec![d.clone()]);

    let expected: FileErrorMap = [(h("f1.kiln"), vec![d]), (h("f2.kiln"), vec![])]
        .into_iter()
        .collect();
    assert_eq!(map, expected);
}

#[test]
fn test_build_file_error_map_adds_files_outside_base() {
    let d = diagnostic("other.kiln", 4, "from elsewhere");
    let map = build_file_error_map(&[h("a.kiln")], vec![d.clone()]);

    assert_eq!(map.len(), 2);
    assert!(map[&h("a.kiln")].is_empty());
    assert_eq!(map[&h("other.kiln")], vec![d]);
}

#[test]
fn test_build_file_error_map_keeps_diagnostic_order() {
    let first = diagnostic("a.kiln", 9, "first");
    let second = diagnostic("a.kiln", 2, "second");
    let map = build_file_error_map(&[h("a.kiln")], vec![first.clone(), second.clone()]);
    assert_eq!(map[&h("a.kiln")], vec![first, second]);
}

#[test]
fn test_replace_for_leaves_no_residue() {
    let mut cache = ErrorCache::new();
    cache.replace_for(
        &[h("a.kiln"), h("b.kiln")],
        vec![diagnostic("a.kiln", 1, "old"), diagnostic("b.kiln", 1, "kept")],
    );

    let fresh = diagnostic("a.kiln", 3, "new");
    cache.replace_for(&[h("a.kiln")], vec![fresh.clone()]);
    assert_eq!(cache.get(&h("a.kiln")), [fresh]);
    assert_eq!(cache.get(&h("b.kiln")).len(), 1);

    cache.replace_for(&[h("a.kiln")], vec![]);
    assert!(cache.get(&h("a.kiln")).is_empty());
    assert_eq!(cache.file_count(), 1);
    assert_eq!(cache.diagnostic_count(), 1);
}

#[test]
fn test_for_files_follows_requested_order() {
    let mut cache = ErrorCache::new();
    let a = diagnostic("a.kiln", 1, "a");
    let b = diagnostic("b.kiln", 1, "b");
    cache.replace_for(&[h("a.kiln"), h("b.kiln")], vec![a.clone(), b.clone()]);

    assert_eq!(cache.for_files(&[h("b.kiln"), h("a.kiln")]), vec![b, a]);
    assert!(cache.for_files(&[h("missing.kiln")]).is_empty());
}
