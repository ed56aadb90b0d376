//! End-to-end tests for the generation pipeline.
//!
//! Tests validate:
//! - a full run writes every artifact and a rerun changes nothing
//! - stale generated files are removed, hand-written ones kept
//! - validation failures leave the output tree untouched
//! - the optional-argument bit snapshot is written, then enforced
//! - the doc cache is persisted
//! - entry points named by the reference runtime exist in generated code

use std::fs;
use std::path::{Path, PathBuf};

use polybind::{generate, run, DriverError, GeneratorConfig, RunSummary};
use polybind_catalog::builtin;
use polybind_codegen::{PlainText, GENERATED_MARKER};
use polybind_eval::{MockLibrary, Options, Runtime, Value};
use polybind_types::CatalogError;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn config_in(dir: &Path) -> GeneratorConfig {
    GeneratorConfig {
        output_dir: dir.join("out"),
        ..GeneratorConfig::default()
    }
}

fn sorted(mut v: Vec<PathBuf>) -> Vec<PathBuf> {
    v.sort();
    v
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    sorted(names.iter().map(PathBuf::from).collect())
}

const ALL_FILES: &[&str] = &[
    "errnostring/errnostring-hash.c",
    "errnostring/errnostring.c",
    "errnostring/errnostring.h",
    "golang/guestfs.go",
    "lua/lua-guestfs.c",
    "rust/src/bindings.rs",
];

// ══════════════════════════════════════════════════════════════════════════════
// Runs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn first_run_creates_everything() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path());
    let summary = run(&cfg).unwrap();

    assert_eq!(sorted(summary.created.clone()), paths(ALL_FILES));
    assert!(summary.updated.is_empty());
    assert!(summary.deleted.is_empty());
    assert!(summary.lines > 0);
    for f in ALL_FILES {
        let text = fs::read_to_string(cfg.output_dir.join(f)).unwrap();
        assert!(text.lines().next().unwrap().contains(GENERATED_MARKER), "{f}");
    }
}

#[test]
fn rerun_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_in(dir.path());
    run(&cfg).unwrap();
    let second = run(&cfg).unwrap();
    assert_eq!(
        second,
        RunSummary {
            unchanged: second.unchanged.clone(),
            lines: second.lines,
            ..RunSummary::default()
        }
    );
    assert_eq!(sorted(second.unchanged), paths(ALL_FILES));
}

#[test]
fn stale_files_are_deleted_unless_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_in(dir.path());
    run(&cfg).unwrap();

    let hand = cfg.output_dir.join("golang/handwritten.go");
    fs::write(&hand, "package guestfs\n").unwrap();

    cfg.targets = vec!["rust".into()];
    cfg.delete_stale = false;
    let kept = run(&cfg).unwrap();
    assert!(kept.deleted.is_empty());
    assert!(cfg.output_dir.join("golang/guestfs.go").exists());

    cfg.delete_stale = true;
    let pruned = run(&cfg).unwrap();
    assert_eq!(
        sorted(pruned.deleted),
        paths(&["golang/guestfs.go", "lua/lua-guestfs.c"])
    );
    assert!(hand.exists());
}

#[test]
fn prefix_flows_into_every_target() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = GeneratorConfig {
        native_prefix: "nbd".into(),
        errno_codec: false,
        ..config_in(dir.path())
    };
    run(&cfg).unwrap();
    let lua = fs::read_to_string(cfg.output_dir.join("lua/lua-guestfs.c")).unwrap();
    assert!(lua.contains("nbd_mount ("));
    assert!(lua.contains("luaopen_nbd"));
    assert!(!cfg.output_dir.join("errnostring").exists());
}

// ══════════════════════════════════════════════════════════════════════════════
// Failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn bad_config_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = GeneratorConfig {
        targets: vec!["ocaml".into()],
        ..config_in(dir.path())
    };
    assert!(matches!(run(&cfg), Err(DriverError::Config(_))));
    assert!(!cfg.output_dir.exists());
}

#[test]
fn malformed_catalog_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(&catalog, "{ \"lists\": [").unwrap();
    let cfg = GeneratorConfig {
        catalog: Some(catalog),
        ..config_in(dir.path())
    };
    assert!(matches!(run(&cfg), Err(DriverError::Load(_))));
    assert!(!cfg.output_dir.exists());
}

#[test]
fn optarg_bits_snapshot_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("optargs.json");
    let cfg = GeneratorConfig {
        optarg_bits: Some(snapshot.clone()),
        ..config_in(dir.path())
    };
    run(&cfg).unwrap();

    let mut saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(saved["add_drive"]["format"], 1);

    // Pretend a previous release had `format` on bit 3.
    saved["add_drive"]["format"] = 3.into();
    fs::write(&snapshot, saved.to_string()).unwrap();
    fs::remove_dir_all(&cfg.output_dir).unwrap();

    let err = run(&cfg).unwrap_err();
    assert!(matches!(
        err,
        DriverError::Catalog(CatalogError::BitReassigned { ref optarg, before: 3, after: 1, .. })
            if optarg == "format"
    ));
    assert!(!cfg.output_dir.exists());
}

#[test]
fn doc_cache_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache/docs.json");
    let cfg = GeneratorConfig {
        doc_cache: Some(cache.clone()),
        ..config_in(dir.path())
    };
    run(&cfg).unwrap();
    let entries: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
    assert!(!entries.is_empty());

    run(&cfg).unwrap();
    let again: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
    assert_eq!(again.len(), entries.len());
}

// ══════════════════════════════════════════════════════════════════════════════
// Generated code vs. reference runtime
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runtime_entry_points_exist_in_generated_go() {
    let catalog = builtin::catalog().unwrap();
    let cfg = GeneratorConfig {
        targets: vec!["go".into()],
        errno_codec: false,
        ..GeneratorConfig::default()
    };
    let artifacts = generate(&catalog, &cfg, &mut PlainText).unwrap();
    assert_eq!(artifacts.len(), 1);
    let go = &artifacts[0].contents;

    let mut rt = Runtime::new(&catalog, MockLibrary::new());
    let calls: &[(&str, Vec<Value>)] = &[
        ("add_drive", vec![Value::str("disk.img")]),
        ("mount", vec![Value::str("/dev/sda1"), Value::str("/")]),
        ("is_dir", vec![Value::str("/etc")]),
    ];
    for (name, args) in calls {
        // Unscripted calls return 0, which some conventions reject; only
        // the entry point matters here.
        let _ = rt.call(name, args, &Options::new());
        let entry = &rt.library().last_call().unwrap().entry;
        assert!(go.contains(&format!("C.{entry}(")), "{entry}");
    }
}
