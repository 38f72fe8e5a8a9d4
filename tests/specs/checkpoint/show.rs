// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint show specs

use crate::prelude::*;

#[test]
fn show_document_summary() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    cli()
        .args(&["checkpoint", "show"])
        .args(&[dir.path.to_str().unwrap()])
        .passes()
        .stdout_has("Current phase: hypothesis")
        .stdout_has("Last completed step: inspect")
        .stdout_has("Completed: inspect")
        .stdout_has("Next step: draft_agent_0");
}

#[test]
fn show_single_phase_as_json() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    let checkpoint = cli()
        .args(&["checkpoint", "show", dir.path.to_str().unwrap(), "--phase", "hypothesis", "-o", "json"])
        .passes()
        .json();
    assert_eq!(checkpoint["completed_steps"], serde_json::json!(["inspect"]));
    assert_eq!(checkpoint["next_step"], "draft_agent_0");
    assert_eq!(checkpoint["data"]["inspect"], "three replicas behind one service");
}

#[test]
fn missing_phase_is_not_found() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();

    cli()
        .args(&["checkpoint", "show", dir.path.to_str().unwrap(), "--phase", "analysis"])
        .exits_with(4)
        .stderr_has("no checkpoint for phase 'analysis'");
}

#[test]
fn directory_without_checkpoint_is_not_found() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5);

    cli()
        .args(&["checkpoint", "show", dir.path.to_str().unwrap()])
        .exits_with(4)
        .stderr_has("no checkpoint in");
}
