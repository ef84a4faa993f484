// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj — thin CLI binary wiring `run`/`replay`/`distill` onto `oj-engine`.
//!
//! Per spec.md §1, the task-declaration parser and subprocess/LLM executors
//! are non-goals of the core; this binary supplies the minimal external
//! collaborator described in §6: it accepts an already-structured task
//! document (JSON, see `task.rs`) and a small built-in step registry
//! (`load-input`, `summarize`, `stub`, `shell`).

mod commands;
mod exit_error;
mod task;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{distill, replay, run};

#[derive(Parser)]
#[command(name = "oj", version, about = "Odd Jobs — deterministic step runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task declaration, creating a fresh job (or reusing one pinned
    /// with --job-id).
    Run(run::RunArgs),
    /// Replay an existing job id against the same task declaration,
    /// reusing every validated, unchanged artifact.
    Replay(replay::ReplayArgs),
    /// Render a success-pattern proposal from a completed job's manifest.
    Distill(distill::DistillArgs),
}

fn main() {
    init_logging();

    if let Err(e) = dispatch() {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = e.to_string();
        if !msg.is_empty() {
            eprintln!("Error: {msg}");
        }
        std::process::exit(code);
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn dispatch() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::handle(args),
        Commands::Replay(args) => replay::handle(args),
        Commands::Distill(args) => distill::handle(args),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
