use std::path::{Path, PathBuf};

use crate::fs::{SourceFilter, discover_sources, display_name, is_source_file, output_path, write_file};

fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    write_file(&path, "x = 1\n").expect("write fixture");
    path
}

#[test]
fn walks_directories_for_trb_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let a = touch(root, "a.trb");
    let b = touch(root, "lib/b.trb");
    touch(root, "lib/notes.md");
    touch(root, "lib/c.rb");

    let files = discover_sources(&[root.to_path_buf()], root, &SourceFilter::accept_all()).expect("discover");
    assert_eq!(files, vec![a, b]);
}

#[test]
fn include_and_exclude_globs_apply_relative_to_base() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let app = touch(root, "app/models/user.trb");
    touch(root, "app/vendor/gem.trb");
    touch(root, "scripts/tool.trb");

    let filter = SourceFilter::new(&["app/**/*.trb".to_string()], &["app/vendor/**".to_string()])
        .expect("valid globs");
    let files = discover_sources(&[root.to_path_buf()], root, &filter).expect("discover");
    assert_eq!(files, vec![app]);
}

#[test]
fn explicit_files_are_kept_and_deduplicated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let a = touch(root, "a.trb");

    let files = discover_sources(&[a.clone(), root.to_path_buf()], root, &SourceFilter::accept_all())
        .expect("discover");
    assert_eq!(files, vec![a]);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    assert!(discover_sources(&[missing], dir.path(), &SourceFilter::accept_all()).is_err());
}

#[test]
fn invalid_glob_is_rejected() {
    assert!(SourceFilter::new(&["app/[".to_string()], &[]).is_err());
}

#[test]
fn output_paths() {
    let base = Path::new("/project");
    let input = Path::new("/project/app/user.trb");
    assert_eq!(output_path(input, base, None, "rb"), PathBuf::from("/project/app/user.rb"));
    assert_eq!(
        output_path(input, base, Some(Path::new("/out/sig")), "rbs"),
        PathBuf::from("/out/sig/app/user.rbs")
    );
    assert_eq!(
        output_path(Path::new("/other/x.trb"), base, Some(Path::new("/out")), "rb"),
        PathBuf::from("/out/x.rb")
    );
}

#[test]
fn names_and_extensions() {
    assert!(is_source_file(Path::new("a/b.trb")));
    assert!(!is_source_file(Path::new("a/b.rb")));
    assert_eq!(display_name(Path::new("/p/src/a.trb"), Path::new("/p")), "src/a.trb");
    assert_eq!(display_name(Path::new("/q/a.trb"), Path::new("/p")), "/q/a.trb");
}
