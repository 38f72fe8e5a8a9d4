// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures and fluent assertions shared by the specs.

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

/// `ce` with color disabled and no state directory.
pub fn cli() -> Cli {
    let mut cmd = Command::cargo_bin("ce").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("COLOR");
    Cli { cmd }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and require a zero exit code.
    pub fn passes(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and require exit code `code`.
    pub fn exits_with(mut self, code: i32) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "stdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout lacks {needle:?}:\n{stdout}");
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(needle), "stdout has {needle:?}:\n{stdout}");
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr lacks {needle:?}:\n{stderr}");
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout()).unwrap()
    }
}

/// A state directory with a sandbox of cycle working directories.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn sandbox_dir(&self) -> PathBuf {
        self.dir.path().join("sandbox")
    }

    /// `ce` pointed at this state directory.
    pub fn ce(&self) -> Cli {
        cli().env("CE_STATE_DIR", self.state_dir())
    }

    /// A working directory holding only a job record.
    pub fn job(&self, id: &str, minute: u32) -> JobDir {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 30, 8, minute, 0).unwrap();
        let path = self
            .sandbox_dir()
            .join(format!("cycle_20260130_08{minute:02}00_{}", &id[id.len() - 6..]));
        std::fs::create_dir_all(&path).unwrap();
        write_json(
            &path.join("job_info.json"),
            &json!({
                "job_id": id,
                "original_request": { "target": "sock-shop" },
                "created_at": created_at.to_rfc3339(),
            }),
        );
        JobDir { path }
    }
}

pub struct JobDir {
    pub path: PathBuf,
}

impl JobDir {
    pub fn checkpoint(self, doc: Value) -> Self {
        write_json(&self.path.join("checkpoints/step_checkpoint.json"), &doc);
        self
    }

    pub fn snapshot(self, snapshot: Value) -> Self {
        write_json(&self.path.join("outputs/output.json"), &snapshot);
        self
    }

    /// Step checkpoint paused inside hypothesis before `draft_agent_0`.
    pub fn paused_in_hypothesis(self) -> Self {
        self.checkpoint(json!({
            "global": {
                "current_phase": "hypothesis",
                "last_completed_step": "inspect",
                "saved_at": "2026-01-30T08:20:00Z"
            },
            "phases": {
                "hypothesis": {
                    "completed_steps": ["inspect"],
                    "next_step": "draft_agent_0",
                    "data": { "inspect": "three replicas behind one service" }
                }
            }
        }))
    }

    /// Snapshot with output for every default phase.
    pub fn finished(self) -> Self {
        let phases = [
            "preprocess",
            "hypothesis",
            "experiment_plan",
            "experiment",
            "analysis",
            "improvement",
            "postprocess",
        ];
        let outputs: serde_json::Map<String, Value> = phases
            .iter()
            .map(|p| (p.to_string(), json!({ "summary": format!("{p} done") })))
            .collect();
        self.snapshot(json!({
            "v": 1,
            "completed_phases": phases,
            "outputs": outputs,
            "saved_at": "2026-01-30T09:00:00Z"
        }))
    }
}

fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub const PAUSED_JOB: &str = "job-pausedAAAAAAAAAAAAA1";
pub const DONE_JOB: &str = "job-doneBBBBBBBBBBBBBBB2";
