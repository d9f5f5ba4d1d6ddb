// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    running = { "Loaded: loaded\n   Active: active (running) since Mon", "", ServiceStatus::Starting },
    finished = { "Loaded: loaded\n   Active: inactive (dead)", "", ServiceStatus::Success },
    failed = { "Loaded: loaded\n   Active: failed (Result: exit-code)", "", ServiceStatus::Failed },
    missing = { "", "Unit ftj-1.service could not be found.", ServiceStatus::Error },
    garbage = { "Active: activating (start)", "", ServiceStatus::Error },
)]
fn systemctl_output_classification(stdout: &str, stderr: &str, expected: ServiceStatus) {
    let (status, _) = parse_systemctl(stdout, stderr);
    assert_eq!(status, expected);
}

#[test]
fn detail_carries_stderr_only_for_missing_units() {
    let (_, detail) = parse_systemctl("", "Unit x.service could not be found.");
    assert!(detail.contains("could not be found"));

    let (_, detail) = parse_systemctl("Active: failed", "noise");
    assert_eq!(detail, "Active: failed");
}
