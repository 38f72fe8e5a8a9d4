// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ce checkpoint` - read the checkpoint files of a working directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ce_core::PhaseOrder;
use ce_storage::{resolve_resume, CheckpointDocument, CheckpointStore, PhaseCheckpoint};
use clap::{Args, Subcommand};

use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub command: CheckpointCommand,
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// Show the step checkpoint document
    Show {
        /// Cycle working directory
        work_dir: PathBuf,

        /// Only show this phase
        #[arg(long)]
        phase: Option<String>,
    },
    /// Show where a resumed job would continue
    ResumePoint {
        /// Cycle working directory
        work_dir: PathBuf,
    },
}

pub fn handle(command: CheckpointCommand, format: OutputFormat) -> Result<()> {
    match command {
        CheckpointCommand::Show { work_dir, phase } => {
            let doc = read_document(&work_dir)?;
            match phase {
                Some(phase) => {
                    let checkpoint = doc.phase(&phase).ok_or_else(|| {
                        ExitError::not_found(format!("no checkpoint for phase '{phase}'"))
                    })?;
                    format_or_json(format, &checkpoint, || print_phase(&phase, &checkpoint))?;
                }
                None => format_or_json(format, &doc, || print_document(&doc))?,
            }
        }
        CheckpointCommand::ResumePoint { work_dir } => {
            if !work_dir.is_dir() {
                return Err(ExitError::not_found(format!(
                    "not a directory: {}",
                    work_dir.display()
                ))
                .into());
            }
            let plan = resolve_resume(&work_dir, &PhaseOrder::default());
            format_or_json(format, &plan, || println!("{}", plan.progress_message()))?;
        }
    }
    Ok(())
}

fn read_document(work_dir: &Path) -> Result<CheckpointDocument> {
    let store = CheckpointStore::for_work_dir(work_dir);
    store
        .read_document()
        .with_context(|| format!("reading {}", store.path().display()))?
        .ok_or_else(|| {
            ExitError::not_found(format!("no checkpoint in {}", work_dir.display())).into()
        })
}

fn print_document(doc: &CheckpointDocument) {
    let current = doc.global.current_phase.as_deref().unwrap_or("-");
    println!("{} {}", color::header("Current phase:"), current);
    if let Some(step) = &doc.global.last_completed_step {
        println!("{} {}", color::context("Last completed step:"), step);
    }
    if let Some(saved_at) = &doc.global.saved_at {
        println!("{} {}", color::context("Saved at:"), saved_at.to_rfc3339());
    }
    for name in PhaseOrder::default()
        .phases()
        .iter()
        .filter(|p| doc.phases.contains_key(p.as_str()))
        .chain(
            doc.phases
                .keys()
                .filter(|p| PhaseOrder::default().index_of(p).is_none()),
        )
    {
        if let Some(checkpoint) = doc.phase(name) {
            println!();
            print_phase(name, &checkpoint);
        }
    }
}

fn print_phase(phase: &str, checkpoint: &PhaseCheckpoint) {
    println!("{}", color::header(phase));
    let completed = if checkpoint.completed_steps.is_empty() {
        "-".to_string()
    } else {
        checkpoint.completed_steps.join(", ")
    };
    println!("  {} {}", color::context("Completed:"), completed);
    let next = checkpoint.next_step.as_deref().unwrap_or("(phase finished)");
    println!("  {} {}", color::context("Next step:"), next);
    if !checkpoint.data.is_empty() {
        let keys: Vec<&str> = checkpoint.data.keys().map(String::as_str).collect();
        println!("  {} {}", color::context("Data:"), keys.join(", "));
    }
    if let Some(feedback) = &checkpoint.pending_feedback {
        println!("  {} {}", color::context("Pending feedback:"), feedback);
    }
}
