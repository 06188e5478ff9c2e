//! distlink CLI - directory-tree synchronization with pluggable transforms
//!
//! Usage: distlink [OPTIONS] <SRC:DST>...
//!
//! Each positional argument pairs a source file or directory with a
//! destination. Recognized source files are transformed (with a map artifact
//! written alongside), everything else is linked or copied.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use distlink::classify::Pairing;
use distlink::config::Config;
use distlink::engine;
use distlink::error::{DistlinkError, DistlinkResult};
use distlink::linkcopy::{LinkPolicy, Outcome};
use distlink::transform::Passthrough;

/// distlink - mirror source trees into destination trees
#[derive(Parser, Debug)]
#[command(name = "distlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source:destination pairings
    #[arg(value_name = "SRC:DST", required = true)]
    pairings: Vec<String>,

    /// Keep existing destination contents and remove only stale entries
    /// (default is to wipe each destination root first)
    #[arg(long)]
    no_clean: bool,

    /// Classify and validate only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Extensions routed through the transformer (overrides config/defaults)
    #[arg(long, value_name = "EXT")]
    ext: Vec<String>,

    /// Suffix for map artifacts
    #[arg(long, value_name = "SUFFIX")]
    map_suffix: Option<String>,

    /// Transformer option as KEY=VALUE (VALUE parsed as JSON when possible)
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Path to a TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format for CI
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v lists per-file outcomes)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run_cli(&cli) {
        if cli.json {
            let event = serde_json::json!({
                "event": "error",
                "kind": err.kind(),
                "message": err.to_string(),
                "paths": err
                    .paths()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            });
            println!("{}", event);
        } else {
            eprintln!("✗ {}", err);
        }
        std::process::exit(err.exit_code());
    }
}

fn run_cli(cli: &Cli) -> DistlinkResult<()> {
    let config = build_config(cli)?;
    let pairings = cli
        .pairings
        .iter()
        .map(|spec| Pairing::parse(spec))
        .collect::<DistlinkResult<Vec<_>>>()?;

    if !cli.json {
        println!("📦 distlink");
        for pairing in &pairings {
            println!(
                "  {} → {}",
                pairing.source.display(),
                pairing.destination.display()
            );
        }
        if !config.clean {
            println!("Mode: incremental (stale entries removed)");
        }
        if cli.dry_run {
            println!("Mode: dry run");
        }
    }

    if cli.dry_run {
        let classification = engine::plan(&pairings, &config)?;
        report_plan(cli, &classification);
        return Ok(());
    }

    let summary = engine::run(&pairings, &config, &Passthrough, LinkPolicy::default())?;
    report_summary(cli, &summary);
    Ok(())
}

/// CLI flags > config file > defaults.
fn build_config(cli: &Cli) -> DistlinkResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if cli.no_clean {
        config.clean = false;
    }
    if !cli.ext.is_empty() {
        config.extensions = cli.ext.clone();
    }
    if let Some(suffix) = &cli.map_suffix {
        config.map_suffix = suffix.clone();
    }
    for spec in &cli.options {
        let (key, raw) = spec.split_once('=').ok_or_else(|| DistlinkError::InvalidOption {
            spec: spec.clone(),
        })?;
        let value = serde_json::from_str(raw).unwrap_or(Value::String(raw.to_string()));
        config.transform_options.insert(key.to_string(), value);
    }

    Ok(config)
}

fn report_plan(cli: &Cli, classification: &distlink::Classification) {
    if cli.json {
        let event = serde_json::json!({
            "event": "plan",
            "directories": classification.directories.len(),
            "transform": classification.transforms.len(),
            "copy": classification.copies.len(),
        });
        println!("{}", event);
        return;
    }

    println!("\n📊 Plan:");
    println!("  Directories: {}", classification.directories.len());
    println!("  Transform: {} files", classification.transforms.len());
    println!("  Copy: {} files", classification.copies.len());
    if cli.verbose > 0 {
        for item in &classification.transforms {
            println!("    ~ {}", item.destination.display());
        }
        for item in &classification.copies {
            println!("    = {}", item.destination.display());
        }
    }
}

fn report_summary(cli: &Cli, summary: &distlink::SyncSummary) {
    if cli.json {
        let event = serde_json::json!({
            "event": "sync",
            "status": "success",
            "transformed": summary.transformed.len(),
            "copied": summary.copied.len(),
            "up_to_date": summary.up_to_date,
            "removed": summary.removed.total(),
            "cleaned_roots": summary.cleaned_roots.len(),
        });
        println!("{}", event);
        return;
    }

    println!("\n📊 Sync Results:");
    if !summary.transformed.is_empty() {
        println!("  ✓ Transformed: {} files", summary.transformed.len());
        if cli.verbose > 0 {
            for path in &summary.transformed {
                println!("    ~ {}", path.display());
            }
        }
    }
    if !summary.copied.is_empty() {
        let count = |o: Outcome| summary.copied.iter().filter(|(_, c)| *c == o).count();
        println!(
            "  ✓ Copied: {} files ({} hardlinked, {} symlinked, {} copied)",
            summary.copied.len(),
            count(Outcome::Hardlinked),
            count(Outcome::Symlinked),
            count(Outcome::Copied),
        );
        if cli.verbose > 0 {
            for (path, outcome) in &summary.copied {
                println!("    = {} ({})", path.display(), outcome.label());
            }
        }
    }
    if summary.up_to_date > 0 {
        println!("  • Up to date: {} files", summary.up_to_date);
    }
    if summary.removed.total() > 0 {
        println!("  🧹 Removed: {} stale entries", summary.removed.total());
        if cli.verbose > 0 {
            for path in summary.removed.files.iter().chain(&summary.removed.dirs) {
                println!("    - {}", path.display());
            }
        }
    }
    println!();
}
