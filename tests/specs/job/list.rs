// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job list specs
//!
//! Jobs are recovered from the sandbox on every invocation.

use crate::prelude::*;

#[test]
fn empty_sandbox_has_no_jobs() {
    let sandbox = Sandbox::empty();
    sandbox.ce().args(&["job", "list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn recovered_jobs_show_status_and_position() {
    let sandbox = Sandbox::empty();
    sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();
    sandbox.job(DONE_JOB, 5).finished();

    let run = sandbox.ce().args(&["job", "list"]).passes();
    let stdout = run.stdout();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "{stdout}");
    assert!(lines[1].starts_with(DONE_JOB), "oldest first:\n{stdout}");
    assert!(lines[1].contains("completed"));
    assert!(lines[2].starts_with(PAUSED_JOB));
    assert!(lines[2].contains("paused"));
    assert!(lines[2].contains("hypothesis/draft_agent_0"));
}

#[test]
fn status_filter_narrows_list() {
    let sandbox = Sandbox::empty();
    sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();
    sandbox.job(DONE_JOB, 5).finished();

    sandbox
        .ce()
        .args(&["job", "list", "--status", "Completed"])
        .passes()
        .stdout_has(DONE_JOB)
        .stdout_lacks(PAUSED_JOB);
}

#[test]
fn unknown_status_is_a_usage_error() {
    let sandbox = Sandbox::empty();
    sandbox
        .ce()
        .args(&["job", "list", "--status", "sleeping"])
        .exits_with(64)
        .stderr_has("unknown job status: sleeping");
}

#[test]
fn json_output_is_an_array_of_jobs() {
    let sandbox = Sandbox::empty();
    sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    let jobs = sandbox.ce().args(&["job", "list", "-o", "json"]).passes().json();
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], PAUSED_JOB);
    assert_eq!(jobs[0]["status"], "paused");
    assert_eq!(jobs[0]["current_step"], "draft_agent_0");
}
