// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job show specs
//!
//! Verify job show behavior including prefix matching.

use crate::prelude::*;

#[test]
fn show_by_prefix() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    sandbox
        .ce()
        .args(&["job", "show", "job-paused"])
        .passes()
        .stdout_has(&format!("Job: {PAUSED_JOB}"))
        .stdout_has("Status: paused")
        .stdout_has("Position: hypothesis/draft_agent_0")
        .stdout_has("Progress: Recovered after restart")
        .stdout_has(&dir.path.display().to_string());
}

#[test]
fn show_completed_job_lists_phase_outputs() {
    let sandbox = Sandbox::empty();
    sandbox.job(DONE_JOB, 5).finished();

    sandbox
        .ce()
        .args(&["job", "show", DONE_JOB])
        .passes()
        .stdout_has("Status: completed")
        .stdout_has("Outputs:")
        .stdout_has("experiment_plan");
}

#[test]
fn show_not_found() {
    let sandbox = Sandbox::empty();
    sandbox
        .ce()
        .args(&["job", "show", "nonexistent-id"])
        .exits_with(4)
        .stderr_has("job not found: nonexistent-id");
}

#[test]
fn show_json_has_work_dir_and_result() {
    let sandbox = Sandbox::empty();
    sandbox.job(DONE_JOB, 5).finished();

    let job = sandbox.ce().args(&["-o", "json", "job", "show", DONE_JOB]).passes().json();
    assert_eq!(job["status"], "completed");
    assert_eq!(job["result"]["analysis"]["summary"], "analysis done");
    assert!(job["work_dir"].as_str().unwrap().contains("cycle_20260130_080500"));
}
