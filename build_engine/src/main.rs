//! Replay harness.
//!
//! Usage: `build_engine [--ruleset RULESET.json] ACTIONS.json`
//!
//! Feeds a JSON array of `{"action": ..., "payload": ...}` requests through
//! a fresh engine, reports each rejection, then prints the final snapshot
//! and canonical hash. Without a ruleset file the built-in catalogue is used.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use build_engine::actions::ActionRequest;
use build_engine::engine::BuildEngine;
use build_engine::ruleset::Ruleset;

/// Replay guardian build actions and print the resulting build
#[derive(Parser)]
#[command(name = "build_engine")]
#[command(about = "Replay guardian build actions", long_about = None)]
#[command(version)]
struct Cli {
    /// Ruleset JSON; the built-in catalogue when omitted
    #[arg(long, short, value_name = "RULESET")]
    ruleset: Option<PathBuf>,

    /// JSON array of action requests
    #[arg(value_name = "ACTIONS")]
    actions: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let ruleset = match &cli.ruleset {
        Some(path) => Ruleset::from_path(path)
            .with_context(|| format!("loading ruleset {}", path.display()))?,
        None => Ruleset::default(),
    };

    let data = fs::read_to_string(&cli.actions)
        .with_context(|| format!("reading {}", cli.actions.display()))?;
    let requests: Vec<ActionRequest> =
        serde_json::from_str(&data).context("parsing action requests")?;

    let mut engine = BuildEngine::new(&ruleset);
    let mut rejected = 0usize;
    for (index, request) in requests.iter().enumerate() {
        if let Err(e) = engine.apply_request(request) {
            rejected += 1;
            println!("#{index} {} rejected [{}]: {e}", request.action, e.code());
        }
    }

    let state = engine.state();
    println!(
        "{}: {} points left, {} accepted, {} rejected",
        state.display_name(),
        state.points,
        engine.applied(),
        rejected
    );
    for stat in &state.stats {
        println!("  {:<12} {}", stat.name, stat.grade());
    }
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    println!("hash: {}", engine.state_hash());
    Ok(())
}
