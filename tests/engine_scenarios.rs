//! End-to-end scenarios for the sync engine.
//!
//! Each test drives the public `engine::run`/`engine::plan` surface over a
//! real temp tree, the way a CLI invocation would.

mod common;

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Map, Value};

use distlink::classify::Pairing;
use distlink::config::Config;
use distlink::engine;
use distlink::error::DistlinkResult;
use distlink::linkcopy::{LinkPolicy, Outcome};
use distlink::transform::{Passthrough, TransformOutput, Transformer};

use common::TestEnv;

/// Delegates to `Passthrough` but counts invocations.
struct CountingTransformer {
    calls: AtomicUsize,
}

impl CountingTransformer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for CountingTransformer {
    fn transform(
        &self,
        source: &Path,
        content: &str,
        options: &Map<String, Value>,
    ) -> DistlinkResult<TransformOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Passthrough.transform(source, content, options)
    }
}

fn incremental() -> Config {
    Config {
        clean: false,
        ..Config::default()
    }
}

#[test]
fn default_sync_produces_transform_map_and_link() {
    let env = TestEnv::new();
    env.write_src("a.js", "let a = 1;\n");
    env.write_src("sub/b.txt", "bytes");

    let pairings = vec![Pairing::new(env.src(), env.out())];
    let summary = engine::run(
        &pairings,
        &Config::default(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap();

    assert_eq!(summary.transformed.len(), 1);
    assert_eq!(summary.copied.len(), 1);

    let primary = fs::read_to_string(env.out().join("a.js")).unwrap();
    assert!(primary.starts_with("let a = 1;\n"));
    assert!(primary.trim_end().ends_with("//# sourceMappingURL=a.js.map"));

    let map: Value =
        serde_json::from_str(&fs::read_to_string(env.out().join("a.js.map")).unwrap()).unwrap();
    assert_eq!(map["version"], serde_json::json!(3));

    #[cfg(unix)]
    assert_eq!(
        common::inode(&env.src().join("sub/b.txt")),
        common::inode(&env.out().join("sub/b.txt")),
        "copy bucket should hardlink by default"
    );
}

#[test]
fn second_run_is_idempotent_and_skips_the_transformer() {
    let env = TestEnv::new();
    env.write_src("a.js", "let a = 1;\n");
    env.write_src("sub/b.txt", "bytes");
    let pairings = vec![Pairing::new(env.src(), env.out())];
    let config = incremental();

    let spy = CountingTransformer::new();
    engine::run(&pairings, &config, &spy, LinkPolicy::default()).unwrap();
    assert_eq!(spy.count(), 1);
    let first_primary = fs::read(env.out().join("a.js")).unwrap();

    let summary = engine::run(&pairings, &config, &spy, LinkPolicy::default()).unwrap();

    // Destination mtimes are now >= source mtimes: nothing re-runs.
    assert_eq!(spy.count(), 1);
    assert_eq!(summary.written(), 0);
    assert_eq!(summary.up_to_date, 2);
    assert_eq!(fs::read(env.out().join("a.js")).unwrap(), first_primary);
}

#[test]
fn deleted_output_is_recreated_without_touching_siblings() {
    let env = TestEnv::new();
    env.write_src("a.js", "let a = 1;\n");
    env.write_src("sub/b.txt", "bytes");
    let pairings = vec![Pairing::new(env.src(), env.out())];
    let config = incremental();

    let spy = CountingTransformer::new();
    engine::run(&pairings, &config, &spy, LinkPolicy::default()).unwrap();

    #[cfg(unix)]
    let b_inode = common::inode(&env.out().join("sub/b.txt"));

    fs::remove_file(env.out().join("a.js")).unwrap();
    let summary = engine::run(&pairings, &config, &spy, LinkPolicy::default()).unwrap();

    assert_eq!(spy.count(), 2);
    assert_eq!(summary.transformed, vec![env.out().join("a.js")]);
    assert!(env.out().join("a.js").exists());
    assert!(env.out().join("a.js.map").exists());

    #[cfg(unix)]
    assert_eq!(common::inode(&env.out().join("sub/b.txt")), b_inode);
}

#[test]
fn nested_single_file_pairing_survives_rerun() {
    let env = TestEnv::new();
    env.write_src("a.js", "x");
    let extra = env.tmp.path().join("extra.txt");
    common::write_file(&extra, "e");

    // The single-file destination nests under the directory pairing's root,
    // so its parent only exists because this run creates it.
    let pairings = vec![
        Pairing::new(env.src(), env.out()),
        Pairing::new(&extra, env.out().join("deep/extra.txt")),
    ];
    let config = incremental();

    engine::run(&pairings, &config, &Passthrough, LinkPolicy::default()).unwrap();
    assert!(env.out().join("deep/extra.txt").exists());

    let summary = engine::run(&pairings, &config, &Passthrough, LinkPolicy::default()).unwrap();

    assert_eq!(summary.removed.total(), 0);
    assert_eq!(summary.written(), 0);
    assert!(env.out().join("deep/extra.txt").exists());
}

#[test]
fn incremental_mode_removes_stale_destination_files() {
    let env = TestEnv::new();
    env.write_src("a.js", "x");
    let pairings = vec![Pairing::new(env.src(), env.out())];
    let config = incremental();

    engine::run(&pairings, &config, &Passthrough, LinkPolicy::default()).unwrap();

    // A leftover from some earlier toolchain, never produced by this run
    common::write_file(&env.out().join("legacy.js.map"), "{}");

    let summary = engine::run(&pairings, &config, &Passthrough, LinkPolicy::default()).unwrap();

    assert!(!env.out().join("legacy.js.map").exists());
    assert_eq!(summary.removed.files, vec![env.out().join("legacy.js.map")]);
    // Produced outputs survive
    assert!(env.out().join("a.js").exists());
    assert!(env.out().join("a.js.map").exists());
}

#[test]
fn force_clean_mode_never_sees_the_stale_file() {
    let env = TestEnv::new();
    env.write_src("a.js", "x");
    common::write_file(&env.out().join("legacy.js.map"), "{}");
    let pairings = vec![Pairing::new(env.src(), env.out())];

    engine::run(
        &pairings,
        &Config::default(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap();

    assert!(!env.out().join("legacy.js.map").exists());
    assert!(env.out().join("a.js").exists());
}

#[test]
fn overlap_fails_before_any_write() {
    let env = TestEnv::new();
    env.write_src("data.txt", "original");

    // Destination equals the source tree itself
    let pairings = vec![Pairing::new(env.src(), env.src())];
    let err = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), "overlap");
    assert!(err.paths().contains(&env.src().join("data.txt")));
    // The input survived untouched
    assert_eq!(
        fs::read_to_string(env.src().join("data.txt")).unwrap(),
        "original"
    );
}

#[test]
fn duplicate_output_fails_listing_the_exact_path() {
    let env = TestEnv::new();
    let js = env.write_src("app.js", "x");
    let other = env.tmp.path().join("other.bin");
    common::write_file(&other, "y");

    // One transform output and one copy output landing on the same path
    let dst = env.out().join("app.js");
    let pairings = vec![
        Pairing::new(&js, &dst),
        Pairing::new(&other, &dst),
    ];
    let err = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), "duplicate-output");
    assert_eq!(err.paths(), vec![dst]);
    assert!(!env.out().exists());
}

#[test]
fn map_artifact_collision_is_a_duplicate() {
    let env = TestEnv::new();
    env.write_src("a.js", "x");
    env.write_src("a.js.map", "handwritten");
    let pairings = vec![Pairing::new(env.src(), env.out())];

    let err = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), "duplicate-output");
    assert_eq!(err.paths(), vec![env.out().join("a.js.map")]);
}

#[cfg(unix)]
#[test]
fn link_fallback_chain_degrades_gracefully() {
    let env = TestEnv::new();
    env.write_src("b.txt", "bytes");
    let pairings = vec![Pairing::new(env.src(), env.out())];

    // Hardlink refused: a symlink resolving to the source appears instead
    let summary = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy {
            hardlink: false,
            symlink: true,
        },
    )
    .unwrap();
    assert_eq!(summary.copied[0].1, Outcome::Symlinked);
    let dst = env.out().join("b.txt");
    assert_eq!(fs::read_to_string(&dst).unwrap(), "bytes");
    assert!(fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());

    // Both links refused: a plain byte-identical file appears
    fs::remove_file(&dst).unwrap();
    let summary = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy {
            hardlink: false,
            symlink: false,
        },
    )
    .unwrap();
    assert_eq!(summary.copied[0].1, Outcome::Copied);
    assert_eq!(fs::read(&dst).unwrap(), fs::read(env.src().join("b.txt")).unwrap());
    assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
    assert_ne!(common::inode(&dst), common::inode(&env.src().join("b.txt")));
}

#[test]
fn missing_sources_are_reported_together() {
    let env = TestEnv::new();
    env.write_src("a.js", "x");

    let gone_a = env.tmp.path().join("gone-a");
    let gone_b = env.tmp.path().join("gone-b");
    let pairings = vec![
        Pairing::new(&gone_a, env.out().join("a")),
        Pairing::new(env.src(), env.out().join("b")),
        Pairing::new(&gone_b, env.out().join("c")),
    ];

    let err = engine::run(
        &pairings,
        &incremental(),
        &Passthrough,
        LinkPolicy::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), "missing-source");
    assert_eq!(err.paths(), vec![gone_a, gone_b]);
    assert!(!env.out().exists());
}

#[test]
fn caller_options_reach_the_transformer_but_forced_keys_win() {
    struct AssertingTransformer;
    impl Transformer for AssertingTransformer {
        fn transform(
            &self,
            source: &Path,
            content: &str,
            options: &Map<String, Value>,
        ) -> DistlinkResult<TransformOutput> {
            assert_eq!(options.get("loose"), Some(&Value::Bool(true)));
            // Caller tried to disable source maps; the engine re-forces them
            assert_eq!(options.get("sourceMap"), Some(&Value::Bool(true)));
            assert!(options.get("sourceRoot").is_some());
            Passthrough.transform(source, content, options)
        }
    }

    let env = TestEnv::new();
    env.write_src("a.js", "x");
    let mut config = incremental();
    config
        .transform_options
        .insert("loose".into(), Value::Bool(true));
    config
        .transform_options
        .insert("sourceMap".into(), Value::Bool(false));

    let pairings = vec![Pairing::new(env.src(), env.out())];
    engine::run(&pairings, &config, &AssertingTransformer, LinkPolicy::default()).unwrap();
}
