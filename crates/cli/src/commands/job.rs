// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ce job` - inspect and purge jobs found in the sandbox

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use ce_core::{Job, JobId, JobStatus, PhaseOrder};
use ce_daemon::{Config, JobManager, ManagerError};
use ce_engine::{Pipeline, PipelineContext, PipelineError, PipelineInput};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::color;
use crate::exit_error::{ExitError, CONFLICT};
use crate::output::{format_or_json, format_time_ago, handle_list, truncate, OutputFormat};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// List jobs
    List {
        /// Filter by status (e.g. "paused", "failed", "completed")
        #[arg(long)]
        status: Option<String>,
    },
    /// Show details of a job
    Show {
        /// Job ID (prefix match)
        id: String,
    },
    /// Forget a job, optionally deleting its working directory
    Purge {
        /// Job ID (prefix match)
        id: String,

        /// Also delete the working directory (only inside allowed bases)
        #[arg(long)]
        files: bool,
    },
}

/// Pipeline stand-in for a manager that only inspects jobs.
///
/// Reports the standard phase order so recovery can place jobs; refuses to run.
struct InspectOnly;

impl Pipeline for InspectOnly {
    fn phases(&self) -> PhaseOrder {
        PhaseOrder::default()
    }

    fn run(
        &mut self,
        _ctx: &mut dyn PipelineContext,
        _input: PipelineInput,
    ) -> Result<Value, PipelineError> {
        Err(PipelineError::Other("the ce CLI does not run cycles".to_string()))
    }
}

/// Manager over the configured sandbox with every job on disk recovered.
pub fn open_manager(config: Config) -> JobManager {
    let factory = |_: &Value| -> Result<Box<dyn Pipeline>, PipelineError> { Ok(Box::new(InspectOnly)) };
    let manager = JobManager::new(config, Arc::new(factory));
    manager.recover();
    manager
}

/// Match `id` exactly, or as the unique prefix of a job id.
pub fn resolve_job_id(manager: &JobManager, id: &str) -> Result<JobId> {
    let jobs = manager.list_jobs(None);
    if let Some(job) = jobs.iter().find(|j| j.id.as_str() == id) {
        return Ok(job.id.clone());
    }
    let matches: Vec<&Job> = jobs
        .iter()
        .filter(|j| j.id.as_str().starts_with(id) || j.id.suffix().starts_with(id))
        .collect();
    match matches.as_slice() {
        [job] => Ok(job.id.clone()),
        [] => Err(ExitError::not_found(format!("job not found: {id}")).into()),
        _ => Err(ExitError::usage(format!(
            "ambiguous job id '{id}' matches {} jobs",
            matches.len()
        ))
        .into()),
    }
}

fn manager_error(err: ManagerError) -> anyhow::Error {
    match err {
        ManagerError::NotFound(id) => ExitError::not_found(format!("job not found: {id}")).into(),
        e @ (ManagerError::Conflict { .. } | ManagerError::OutsideAllowedBase(_)) => {
            ExitError::new(CONFLICT, e.to_string()).into()
        }
        e => e.into(),
    }
}

pub fn handle(command: JobCommand, config: Config, format: OutputFormat) -> Result<()> {
    let manager = open_manager(config);
    match command {
        JobCommand::List { status } => {
            let status = status
                .map(|s| s.to_lowercase().parse::<JobStatus>())
                .transpose()
                .map_err(ExitError::usage)?;
            let jobs = manager.list_jobs(status);
            handle_list(format, &jobs, "No jobs", format_job_list)?;
        }
        JobCommand::Show { id } => {
            let id = resolve_job_id(&manager, &id)?;
            let job = manager
                .get_job(&id)
                .ok_or_else(|| ExitError::not_found(format!("job not found: {id}")))?;
            format_or_json(format, &job, || print_job(&job))?;
        }
        JobCommand::Purge { id, files } => {
            let id = resolve_job_id(&manager, &id)?;
            let report = manager.purge(&id, files).map_err(manager_error)?;
            format_or_json(format, &report, || {
                println!(
                    "Purged job {} ({} {})",
                    color::header(report.job_id.as_str()),
                    color::context("files:"),
                    report.files
                );
            })?;
        }
    }
    Ok(())
}

pub(crate) fn format_job_list(jobs: &[Job], out: &mut dyn Write) {
    let _ = writeln!(
        out,
        "{:<24} {:<10} {:<28} {:<8} PROGRESS",
        "ID", "STATUS", "POSITION", "UPDATED"
    );
    for job in jobs {
        let status = job.status.to_string();
        // Pad outside the color codes so columns stay aligned.
        let pad = " ".repeat(10usize.saturating_sub(status.len()));
        let _ = writeln!(
            out,
            "{:<24} {}{} {:<28} {:<8} {}",
            job.id.as_str(),
            color::status(&status),
            pad,
            truncate(&job.position(), 28),
            format_time_ago(job.updated_at_ms),
            truncate(job.progress.as_deref().unwrap_or("-"), 60),
        );
    }
}

fn print_job(job: &Job) {
    println!("{} {}", color::header("Job:"), job.id);
    println!("  {} {}", color::context("Status:"), color::status(&job.status.to_string()));
    println!("  {} {}", color::context("Position:"), job.position());
    println!("  {} {}", color::context("Work dir:"), job.work_dir.display());
    println!("  {} {}", color::context("Updated:"), format_time_ago(job.updated_at_ms));
    if let Some(progress) = &job.progress {
        println!("  {} {}", color::context("Progress:"), progress);
    }
    if let Some(error) = &job.error {
        println!();
        println!("  {} {}", color::context("Error:"), error);
    }
    if let Some(Value::Object(outputs)) = &job.result {
        println!();
        println!("  {}", color::header("Outputs:"));
        for phase in outputs.keys() {
            println!("    {}", color::muted(phase));
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
