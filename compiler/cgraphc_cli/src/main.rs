//! `cgraphc`: a thin CLI shell around [`cgraphc_cli::run`], for manually inspecting how the
//! callgraph core resolves a hand-written compilation unit. See `src/parser.rs` for the tiny
//! text format it reads.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cgraphc::DriverConfig;
use cgraphc_cli::run;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    WholeUnit,
    Streaming,
}

/// Drive a hand-written compilation unit through the callgraph core and report what survives.
#[derive(Debug, Parser)]
#[command(name = "cgraphc", version, about)]
struct Cli {
    /// Path to a `.cg` source file written in the toy text format (see `src/parser.rs`).
    input: PathBuf,

    /// Whole-unit defers analysis until end-of-input; streaming analyzes and emits each
    /// function as it is finalized.
    #[arg(long, value_enum, default_value_t = ModeArg::WholeUnit)]
    mode: ModeArg,

    /// Treat the whole program as known (clears `public` on reachable-but-invisible symbols).
    #[arg(long)]
    whole_program: bool,

    /// Force the verifier on even in a release build.
    #[arg(long)]
    verify: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let mut config = match cli.mode {
        ModeArg::WholeUnit => DriverConfig::whole_unit(),
        ModeArg::Streaming => DriverConfig::streaming(),
    };
    config = config.with_whole_program(cli.whole_program);
    if cli.verify {
        config = config.with_verify_at_quiescence(true);
    }

    match run(&source, config) {
        Ok(report) => {
            println!("surviving functions: {}", report.surviving_functions.join(", "));
            println!("surviving variables: {}", report.surviving_variables.join(", "));
            println!("emission order: {}", report.emission_order.join(", "));
            println!("collection points: {}", report.collection_points);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("internal compiler error: {err}");
            ExitCode::FAILURE
        }
    }
}
