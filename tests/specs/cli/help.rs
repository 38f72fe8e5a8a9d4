// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn ce_without_command_prints_usage_and_fails() {
    cli().exits_with(2).stderr_has("Usage:");
}

#[test]
fn ce_help_lists_command_groups() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("job")
        .stdout_has("checkpoint");
}

#[test]
fn job_help_shows_subcommands() {
    cli()
        .args(&["job", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("show")
        .stdout_has("purge");
}

#[test]
fn checkpoint_help_shows_subcommands() {
    cli()
        .args(&["checkpoint", "--help"])
        .passes()
        .stdout_has("show")
        .stdout_has("resume-point");
}

#[test]
fn version_shows_package_version() {
    cli().args(&["--version"]).passes().stdout_has("ce 0.2");
}
