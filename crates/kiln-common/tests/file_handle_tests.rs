use super::*;
use std::collections::HashSet;

#[test]
fn test_spellings_of_same_file_share_handle() {
    let a = FileHandle::new("pkg/./mod.kiln").unwrap();
    let b = FileHandle::new("pkg/sub/../mod.kiln").unwrap();
    let c = FileHandle::new("pkg//mod.kiln").unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.as_str(), "pkg/mod.kiln");

    let mut set = HashSet::new();
    set.insert(a);
    set.insert(b);
    set.insert(c);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_backslashes_are_normalized() {
    let handle = FileHandle::new("pkg\\mod.kiln").unwrap();
    assert_eq!(handle.as_str(), "pkg/mod.kiln");
}

#[test]
fn test_escaping_root_is_rejected() {
    assert!(FileHandle::new("../outside.kiln").is_none());
    assert!(FileHandle::new("a/../../outside.kiln").is_none());
    assert!(FileHandle::new("").is_none());
    assert!(FileHandle::new("/abs/path.kiln").is_none());
}

#[test]
fn test_absolute_path_under_root() {
    let root = Path::new("/project");
    let handle = FileHandle::from_path(root, Path::new("/project/a/b.kiln")).unwrap();
    assert_eq!(handle.as_str(), "a/b.kiln");

    let dotted = FileHandle::from_path(
        Path::new("/project/./"),
        Path::new("/project/x/../a/b.kiln"),
    );
    assert_eq!(dotted, Some(handle));
}

#[test]
fn test_absolute_path_outside_root() {
    let root = Path::new("/project");
    assert!(FileHandle::from_path(root, Path::new("/elsewhere/a.kiln")).is_none());
}

#[test]
fn test_relative_path_is_relative_to_root() {
    let root = Path::new("/project");
    let handle = FileHandle::from_path(root, Path::new("a/b.kiln")).unwrap();
    assert_eq!(handle.to_path(root), PathBuf::from("/project/a/b.kiln"));
}

#[test]
fn test_from_roots_first_match_wins() {
    let roots = [Path::new("/project"), Path::new("/stubs")];
    let handle = FileHandle::from_roots(roots, Path::new("/stubs/typing.kiln")).unwrap();
    assert_eq!(handle.as_str(), "typing.kiln");
    assert!(FileHandle::from_roots(roots, Path::new("/tmp/x.kiln")).is_none());
}

#[test]
fn test_serde_roundtrip_normalizes() {
    let handle: FileHandle = serde_json::from_str("\"a/./b.kiln\"").unwrap();
    assert_eq!(handle.as_str(), "a/b.kiln");
    assert_eq!(serde_json::to_string(&handle).unwrap(), "\"a/b.kiln\"");
    assert!(serde_json::from_str::<FileHandle>("\"../x\"").is_err());
}
