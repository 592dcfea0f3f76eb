//! Tribunal -- a Diplomacy turn adjudicator speaking a line protocol.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Logs go to stderr and are filtered with `RUST_LOG`.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tribunal::board::WorldMap;
use tribunal::engine::{Engine, Flow};
use tribunal::protocol::parser::parse_command;
use tribunal::rules::RuleOptions;

#[derive(Parser)]
#[command(name = "tribunal")]
#[command(about = "Adjudicate Diplomacy turns over a line protocol", version)]
struct Args {
    /// Variant description (TOML); the standard map when omitted
    #[arg(long, value_name = "TOML")]
    variant: Option<PathBuf>,

    /// Rule options (TOML); standard rules when omitted
    #[arg(long, value_name = "TOML")]
    rules: Option<PathBuf>,

    /// Print results as JSON objects
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the protocol loop until `quit` or end of input.
fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let loaded;
    let map = match &args.variant {
        Some(path) => {
            loaded = WorldMap::load(path)?;
            &loaded
        }
        None => WorldMap::standard(),
    };
    let rules = match &args.rules {
        Some(path) => RuleOptions::load(path)?,
        None => RuleOptions::default(),
    };
    info!(variant = map.name(), ?rules, "engine ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new(map, rules).with_json(args.json);

    for line in stdin.lock().lines() {
        let Some(cmd) = parse_command(&line?) else {
            continue;
        };
        if engine.dispatch(cmd, &mut out)? == Flow::Quit {
            break;
        }
    }
    out.flush()?;
    Ok(())
}
