// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ce: operator CLI for chaos cycle jobs

mod color;
mod commands;
mod exit_error;
mod output;

use anyhow::Result;
use ce_daemon::{init_logging, Config};
use clap::{Parser, Subcommand};

use commands::{checkpoint, job};
use output::OutputFormat;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")");

#[derive(Parser)]
#[command(
    name = "ce",
    version,
    long_version = LONG_VERSION,
    about = "Inspect chaos cycle jobs and their checkpoints",
    styles = color::styles(),
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Jobs in the sandbox
    Job(job::JobArgs),
    /// Checkpoint files of a working directory
    Checkpoint(checkpoint::CheckpointArgs),
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Job(args) => {
            let config = Config::load()?;
            let _guard = init_logging(&config)?;
            job::handle(args.command, config, cli.output)
        }
        Commands::Checkpoint(args) => checkpoint::handle(args.command, cli.output),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_error::exit_code(&err));
    }
}
