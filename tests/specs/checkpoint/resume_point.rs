// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume point specs
//!
//! The step checkpoint wins over the output snapshot; with neither the
//! cycle restarts.

use crate::prelude::*;
use serde_json::json;

#[test]
fn step_checkpoint_gives_step_position() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    cli()
        .args(&["checkpoint", "resume-point", dir.path.to_str().unwrap()])
        .passes()
        .stdout_eq("Resuming from hypothesis/draft_agent_0 (step checkpoint)\n");
}

#[test]
fn finished_phase_resumes_at_next_phase() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).checkpoint(json!({
        "global": { "current_phase": "experiment_plan" },
        "phases": {
            "experiment_plan": { "completed_steps": ["run"], "next_step": null, "data": {} }
        }
    }));

    let plan = cli()
        .args(&["checkpoint", "resume-point", dir.path.to_str().unwrap(), "-o", "json"])
        .passes()
        .json();
    assert_eq!(plan["source"], "phase_boundary");
    assert_eq!(plan["point"], json!({ "phase": "experiment" }));
}

#[test]
fn snapshot_only_resumes_at_first_phase_without_output() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5).snapshot(json!({
        "v": 1,
        "completed_phases": ["preprocess", "hypothesis"],
        "outputs": { "preprocess": {}, "hypothesis": {} },
        "saved_at": "2026-01-30T09:00:00Z"
    }));

    cli()
        .args(&["checkpoint", "resume-point", dir.path.to_str().unwrap()])
        .passes()
        .stdout_eq("Resuming from experiment_plan (output snapshot)\n");
}

#[test]
fn nothing_on_disk_restarts() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5);

    cli()
        .args(&["checkpoint", "resume-point", dir.path.to_str().unwrap()])
        .passes()
        .stdout_eq("No checkpoint found, restarting from the beginning\n");
}

#[test]
fn every_phase_done_reports_finished() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5).finished();

    cli()
        .args(&["checkpoint", "resume-point", dir.path.to_str().unwrap()])
        .passes()
        .stdout_eq("All phases already completed\n");
}
