// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn state_dir_prefers_explicit_variable() {
    std::env::set_var("CE_STATE_DIR", "/srv/ce");
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/srv/ce"));
    std::env::remove_var("CE_STATE_DIR");
    std::env::remove_var("XDG_STATE_HOME");
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    std::env::remove_var("CE_STATE_DIR");
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/xdg/ce"));
    std::env::remove_var("XDG_STATE_HOME");
}

#[test]
#[serial]
fn relay_timeout_parses_millis() {
    for (raw, expected) in [
        ("250", Some(Duration::from_millis(250))),
        (" 40 ", Some(Duration::from_millis(40))),
        ("soon", None),
        ("-5", None),
    ] {
        std::env::set_var("CE_RELAY_TIMEOUT_MS", raw);
        assert_eq!(relay_timeout(), expected, "raw value {raw:?}");
    }
    std::env::remove_var("CE_RELAY_TIMEOUT_MS");
}

#[test]
#[serial]
fn retention_is_in_hours() {
    std::env::set_var("CE_RETENTION_HOURS", "2");
    assert_eq!(retention(), Some(Duration::from_secs(7200)));
    std::env::remove_var("CE_RETENTION_HOURS");
    assert_eq!(retention(), None);
}

#[test]
#[serial]
fn purge_bases_splits_path_list() {
    let joined = std::env::join_paths(["/a/sandbox", "/b/runs"]).unwrap();
    std::env::set_var("CE_PURGE_BASES", &joined);
    assert_eq!(
        purge_bases(),
        Some(vec![PathBuf::from("/a/sandbox"), PathBuf::from("/b/runs")])
    );
    std::env::set_var("CE_PURGE_BASES", "");
    assert_eq!(purge_bases(), None);
    std::env::remove_var("CE_PURGE_BASES");
}

#[test]
#[serial]
fn log_filter_order() {
    std::env::remove_var("CE_LOG");
    std::env::remove_var("RUST_LOG");
    assert_eq!(log_filter(), "info");

    std::env::set_var("RUST_LOG", "warn");
    assert_eq!(log_filter(), "warn");

    std::env::set_var("CE_LOG", "ce_daemon=debug");
    assert_eq!(log_filter(), "ce_daemon=debug");

    std::env::remove_var("CE_LOG");
    std::env::remove_var("RUST_LOG");
}
