use dirdigest_core::{
    AppError, CancelFlag, Collection, Collector, Config, MaxDepth, PartialConfig, SkipReason,
    StaticIgnoreSource, collect_files,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (rel, content) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
    }
    dir
}

fn config_for(root: &Path, overrides: PartialConfig) -> Config {
    let overrides = PartialConfig {
        root_dir: Some(root.to_path_buf()),
        ..overrides
    };
    Config::resolve(None, &overrides)
}

fn run(root: &Path, overrides: PartialConfig) -> Collection {
    collect_files(&config_for(root, overrides)).expect("Collection failed")
}

fn paths(collection: &Collection) -> Vec<&str> {
    collection.files.iter().map(|f| f.path.as_str()).collect()
}

fn reason_for<'a>(collection: &'a Collection, path: &str) -> Option<&'a SkipReason> {
    collection
        .skipped
        .iter()
        .find(|s| s.path == path)
        .map(|s| &s.reason)
}

#[test]
fn scenario_default_folder_exclusion_and_allowlist() {
    let ten_lines = (1..=10)
        .map(|i| format!("line {}", i))
        .collect::<Vec<_>>()
        .join("\n");
    let dir = tree(&[
        ("a.ts", ten_lines.as_str()),
        ("b/node_modules/x.ts", "export {}"),
        ("b/c.js", "console.log(1)"),
    ]);
    let result = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".ts".into()]),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["a.ts"]);
    assert_eq!(result.stats.total_files, 1);
    assert_eq!(result.stats.total_lines, 10);
    assert_eq!(
        reason_for(&result, "b/node_modules"),
        Some(&SkipReason::ExcludedFolder)
    );
    assert_eq!(
        reason_for(&result, "b/c.js"),
        Some(&SkipReason::ExtensionNotAllowed {
            extension: ".js".into()
        })
    );
}

#[test]
fn scenario_gitignore_directory_rule_from_disk() {
    let dir = tree(&[
        (".gitignore", "dist/\n"),
        ("dist/out.ts", "out"),
        ("src/in.ts", "in"),
    ]);
    let result = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".ts".into()]),
            respect_gitignore: Some(true),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["src/in.ts"]);
    assert_eq!(reason_for(&result, "dist"), Some(&SkipReason::Ignored));
}

#[test]
fn scenario_gitignore_through_injected_source() {
    let dir = tree(&[("dist/out.ts", "out"), ("src/in.ts", "in")]);
    let config = config_for(dir.path(), PartialConfig::default());
    let result = Collector::new(config)
        .with_ignore_source(StaticIgnoreSource("dist/\n".to_string()))
        .run()
        .expect("Collection failed");
    assert_eq!(paths(&result), vec!["src/in.ts"]);
}

#[test]
fn gitignore_disabled_keeps_ignored_paths() {
    let dir = tree(&[
        (".gitignore", "dist/\n"),
        ("dist/out.ts", "out"),
        ("src/in.ts", "in"),
    ]);
    let result = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".ts".into()]),
            respect_gitignore: Some(false),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["dist/out.ts", "src/in.ts"]);
}

#[test]
fn gitignore_negation_reincludes_file() {
    let dir = tree(&[
        (".gitignore", "*.log\n!keep.log\n"),
        ("debug.log", "d"),
        ("keep.log", "k"),
    ]);
    let result = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".log".into()]),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["keep.log"]);
}

#[test]
fn scenario_size_ceiling_rejects_without_error() {
    let big = "a".repeat(2000);
    let dir = tree(&[("big.txt", big.as_str()), ("small.txt", "ok")]);
    let result = run(
        dir.path(),
        PartialConfig {
            max_size_mb: Some(0.001),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["small.txt"]);
    assert_eq!(
        reason_for(&result, "big.txt"),
        Some(&SkipReason::TooLarge { size_bytes: 2000 })
    );
}

#[test]
fn scenario_exclude_pattern_at_root() {
    let dir = tree(&[("a.ts", "a"), ("a.test.ts", "t"), ("src/b.test.ts", "t")]);
    let result = run(
        dir.path(),
        PartialConfig {
            exclude_patterns: Some(vec!["**/*.test.ts".into()]),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["a.ts"]);
}

#[test]
fn max_depth_zero_collects_only_root_files() {
    let dir = tree(&[("root.md", "r"), ("sub/one.md", "1"), ("sub/deeper/two.md", "2")]);
    let result = run(
        dir.path(),
        PartialConfig {
            max_depth: Some(MaxDepth::Limited(0)),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["root.md"]);
    assert_eq!(reason_for(&result, "sub"), Some(&SkipReason::DepthExceeded));
}

#[test]
fn max_depth_one_stops_below_first_level() {
    let dir = tree(&[("root.md", "r"), ("sub/one.md", "1"), ("sub/deeper/two.md", "2")]);
    let result = run(
        dir.path(),
        PartialConfig {
            max_depth: Some(MaxDepth::Limited(1)),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["root.md", "sub/one.md"]);
}

#[test]
fn excluded_folder_prunes_subtree_regardless_of_includes() {
    let dir = tree(&[
        ("vendor/lib.rs", "v"),
        ("src/vendor/inner.rs", "v"),
        ("src/main.rs", "m"),
    ]);
    let result = run(
        dir.path(),
        PartialConfig {
            exclude_folders: Some(vec!["vendor".into()]),
            include_patterns: Some(vec!["**/*.rs".into()]),
            ..Default::default()
        },
    );
    assert_eq!(paths(&result), vec!["src/main.rs"]);
}

#[test]
fn allowlist_of_all_present_extensions_equals_allow_all() {
    let dir = tree(&[
        ("a.ts", "a"),
        ("b.JS", "b"),
        ("docs/c.md", "c"),
        ("docs/d.MD", "d"),
    ]);
    let everything = run(dir.path(), PartialConfig::default());
    let universe = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".ts".into(), ".js".into(), ".md".into()]),
            ..Default::default()
        },
    );
    assert_eq!(everything.files, universe.files);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tree(&[
        ("z.rs", "z"),
        ("a/b/c.rs", "c"),
        ("a/a.rs", "a"),
        ("m/n/o/p.rs", "p"),
    ]);
    let first = run(dir.path(), PartialConfig::default());
    let second = run(dir.path(), PartialConfig::default());
    assert_eq!(first.files, second.files);
    assert_eq!(first.skipped, second.skipped);
    assert_eq!(paths(&first), vec!["a/a.rs", "a/b/c.rs", "m/n/o/p.rs", "z.rs"]);
}

#[test]
fn statistics_match_collected_files() {
    let dir = tree(&[
        ("a.rs", "fn a() {}\n"),
        ("b.rs", "x\ny"),
        ("README", "hello"),
        ("docs/guide.md", "# guide\n\ntext\n"),
    ]);
    let result = run(dir.path(), PartialConfig::default());
    assert_eq!(result.stats.total_files, result.files.len());
    let bucket_lines: usize = result.stats.by_extension.values().map(|b| b.lines).sum();
    assert_eq!(result.stats.total_lines, bucket_lines);
    assert_eq!(result.stats.by_extension[".rs"].files, 2);
    assert_eq!(result.stats.by_extension[".rs"].lines, 4);
    assert_eq!(result.stats.by_extension[""].lines, 1);
    assert_eq!(result.stats.by_extension[".md"].lines, 4);
}

#[test]
fn empty_result_is_not_an_error() {
    let dir = tree(&[("a.rs", "a")]);
    let result = run(
        dir.path(),
        PartialConfig {
            file_types: Some(vec![".py".into()]),
            ..Default::default()
        },
    );
    assert!(result.files.is_empty());
    assert_eq!(result.stats.total_files, 0);
}

#[test]
fn non_text_file_is_skipped_and_run_continues() {
    let dir = tree(&[("ok.txt", "fine")]);
    fs::write(dir.path().join("blob.dat"), [0xffu8, 0xfe, 0xfd]).expect("Failed to write file");
    let result = run(dir.path(), PartialConfig::default());
    assert_eq!(paths(&result), vec!["ok.txt"]);
    assert_eq!(reason_for(&result, "blob.dat"), Some(&SkipReason::NotText));
}

#[test]
fn missing_root_is_a_configuration_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_for(&dir.path().join("absent"), PartialConfig::default());
    assert!(matches!(
        collect_files(&config),
        Err(AppError::RootNotFound(_))
    ));
}

#[test]
fn file_root_is_a_configuration_error() {
    let dir = tree(&[("file.txt", "x")]);
    let config = config_for(&dir.path().join("file.txt"), PartialConfig::default());
    assert!(matches!(
        collect_files(&config),
        Err(AppError::RootNotDirectory(_))
    ));
}

#[test]
fn invalid_glob_aborts_before_walking() {
    let dir = tree(&[("a.rs", "a")]);
    let config = config_for(
        dir.path(),
        PartialConfig {
            include_patterns: Some(vec!["[".into()]),
            ..Default::default()
        },
    );
    assert!(matches!(collect_files(&config), Err(AppError::Glob(_))));
}

#[test]
fn cancelled_run_returns_no_partial_result() {
    let dir = tree(&[("a.rs", "a"), ("b/c.rs", "c")]);
    let cancel = CancelFlag::new();
    cancel.cancel();
    let result = Collector::new(config_for(dir.path(), PartialConfig::default()))
        .with_cancel_flag(cancel)
        .run();
    assert!(matches!(result, Err(AppError::Cancelled)));
}

#[cfg(unix)]
#[test]
fn symlinks_are_never_followed_or_collected() {
    use std::os::unix::fs::symlink;

    let dir = tree(&[("real/a.ts", "a"), ("b.ts", "b")]);
    symlink(dir.path().join("b.ts"), dir.path().join("link.ts")).expect("Failed to link file");
    symlink(dir.path().join("real"), dir.path().join("linked_dir")).expect("Failed to link dir");
    symlink(dir.path(), dir.path().join("real/loop")).expect("Failed to link root");

    let result = run(dir.path(), PartialConfig::default());
    assert_eq!(paths(&result), vec!["b.ts", "real/a.ts"]);
    assert_eq!(reason_for(&result, "link.ts"), Some(&SkipReason::Symlink));
    assert_eq!(reason_for(&result, "linked_dir"), Some(&SkipReason::Symlink));
    assert_eq!(reason_for(&result, "real/loop"), Some(&SkipReason::Symlink));
}

#[test]
fn collected_files_are_sorted_by_relative_path() {
    let dir = tree(&[("b.rs", "b"), ("a/z.rs", "z"), ("A.rs", "A"), ("a.rs", "a")]);
    let result = run(dir.path(), PartialConfig::default());
    let mut sorted = paths(&result);
    sorted.sort();
    assert_eq!(paths(&result), sorted);
}

#[test]
fn very_deep_tree_is_walked_without_exhausting_the_stack() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let depth = 1000;
    let mut nested = dir.path().to_path_buf();
    for _ in 0..depth {
        nested.push("a");
    }
    fs::create_dir_all(&nested).expect("Failed to create deep tree");
    fs::write(nested.join("f.rs"), "fn deep() {}").expect("Failed to write file");

    let result = run(dir.path(), PartialConfig::default());
    let expected = format!("{}f.rs", "a/".repeat(depth));
    assert_eq!(paths(&result), vec![expected.as_str()]);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_skipped_and_siblings_collected() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree(&[("locked/secret.rs", "s"), ("ok.rs", "o")]);
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
        .expect("Failed to change permissions");

    // Privileged users can still list the directory.
    let listable = fs::read_dir(&locked).is_ok();
    let result = run(dir.path(), PartialConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
        .expect("Failed to restore permissions");
    if listable {
        return;
    }

    assert_eq!(paths(&result), vec!["ok.rs"]);
    assert!(matches!(
        reason_for(&result, "locked"),
        Some(SkipReason::Unreadable { .. })
    ));
}
