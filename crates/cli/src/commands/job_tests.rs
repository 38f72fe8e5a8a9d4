// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ce_daemon::JobSpec;
use serde_json::json;
use serial_test::serial;
use tempfile::tempdir;

fn seeded(count: usize) -> (tempfile::TempDir, Vec<JobId>) {
    let dir = tempdir().unwrap();
    let manager = open_manager(Config::for_state_dir(dir.path()));
    let ids = (0..count)
        .map(|n| manager.create_job(JobSpec::new(json!({ "n": n }))).unwrap())
        .collect();
    (dir, ids)
}

#[test]
fn reopened_manager_recovers_jobs_as_paused() {
    let (dir, ids) = seeded(2);
    let manager = open_manager(Config::for_state_dir(dir.path()));

    let jobs = manager.list_jobs(None);
    assert_eq!(jobs.len(), 2);
    for id in &ids {
        assert_eq!(manager.get_job(id).unwrap().status, JobStatus::Paused);
    }
}

#[test]
fn job_id_resolves_by_exact_id_and_unique_prefix() {
    let (dir, ids) = seeded(1);
    let manager = open_manager(Config::for_state_dir(dir.path()));

    assert_eq!(resolve_job_id(&manager, ids[0].as_str()).unwrap(), ids[0]);
    assert_eq!(resolve_job_id(&manager, &ids[0].suffix()[..6]).unwrap(), ids[0]);

    let err = resolve_job_id(&manager, "job-nope").unwrap_err();
    assert_eq!(crate::exit_error::exit_code(&err), crate::exit_error::NOT_FOUND);
}

#[test]
fn shared_prefix_is_ambiguous() {
    let (dir, _) = seeded(2);
    let manager = open_manager(Config::for_state_dir(dir.path()));

    let err = resolve_job_id(&manager, "job-").unwrap_err();
    assert_eq!(crate::exit_error::exit_code(&err), crate::exit_error::USAGE);
    assert!(err.to_string().contains("matches 2 jobs"), "{err}");
}

#[test]
fn purge_of_recovered_job_deletes_its_directory() {
    let (dir, ids) = seeded(1);
    let manager = open_manager(Config::for_state_dir(dir.path()));
    let work_dir = manager.get_job(&ids[0]).unwrap().work_dir;

    let report = manager.purge(&ids[0], true).unwrap();
    assert_eq!(report.files, ce_daemon::FileRemoval::Deleted);
    assert!(!work_dir.exists());
    assert!(open_manager(Config::for_state_dir(dir.path())).list_jobs(None).is_empty());
}

#[test]
#[serial]
fn list_renders_header_and_one_row_per_job() {
    std::env::set_var("NO_COLOR", "1");
    let (dir, ids) = seeded(2);
    let manager = open_manager(Config::for_state_dir(dir.path()));

    let mut out = Vec::new();
    format_job_list(&manager.list_jobs(None), &mut out);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ID"));
    assert!(lines[1].starts_with(ids[0].as_str()) || lines[1].starts_with(ids[1].as_str()));
    assert!(lines[1].contains("paused"));
    assert!(lines[1].contains("Recovered after restart"));
}
