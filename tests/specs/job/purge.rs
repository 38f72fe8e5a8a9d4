// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job purge specs

use crate::prelude::*;

#[test]
fn purge_with_files_deletes_working_directory() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5).finished();

    sandbox
        .ce()
        .args(&["job", "purge", DONE_JOB, "--files"])
        .passes()
        .stdout_has(&format!("Purged job {DONE_JOB}"))
        .stdout_has("files: deleted");
    assert!(!dir.path.exists());

    sandbox.ce().args(&["job", "list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn purge_without_files_keeps_directory() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(DONE_JOB, 5).finished();

    let report = sandbox
        .ce()
        .args(&["job", "purge", DONE_JOB, "-o", "json"])
        .passes()
        .json();
    assert_eq!(report["files"], "skipped");
    assert!(dir.path.exists());
}

#[test]
fn purge_outside_allowed_bases_is_refused() {
    let sandbox = Sandbox::empty();
    let dir = sandbox.job(PAUSED_JOB, 10).paused_in_hypothesis();
    let elsewhere = sandbox.state_dir().join("archive");
    std::fs::create_dir_all(&elsewhere).unwrap();

    sandbox
        .ce()
        .env("CE_PURGE_BASES", &elsewhere)
        .args(&["job", "purge", PAUSED_JOB, "--files"])
        .exits_with(3)
        .stderr_has("outside allowed base directories");
    assert!(dir.path.join("job_info.json").exists());
}

#[test]
fn purge_unknown_job_fails() {
    let sandbox = Sandbox::empty();
    sandbox
        .ce()
        .args(&["job", "purge", "job-missing"])
        .exits_with(4)
        .stderr_has("job not found");
}
