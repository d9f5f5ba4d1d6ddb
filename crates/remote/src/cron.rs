// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crontab text editing.
//!
//! `@reboot` entries are written as a comment/command pair tagged with a
//! task name so they can be removed as a unit later.

/// Build the new crontab with `entry` appended, or `None` if it is already
/// present.
pub fn append_entry(current: &str, entry: &str, comment: Option<&str>) -> Option<String> {
    let entry = match comment {
        Some(c) => format!("# {c}\n{entry}"),
        None => entry.to_string(),
    };
    if current.contains(&entry) {
        return None;
    }
    Some(format!("{current}\n{entry}\n"))
}

/// The comment written above a named `@reboot` entry.
pub fn reboot_comment(task_name: &str) -> String {
    format!("Reboot task: {task_name}")
}

/// Build the crontab with every line mentioning `task_name` removed,
/// dropping the comment line paired with a removed entry. Returns `None`
/// when nothing changed.
pub fn strip_task(current: &str, task_name: &str) -> Option<String> {
    let mut kept: Vec<&str> = Vec::new();
    let mut skip_next = false;
    for line in current.lines() {
        if skip_next {
            skip_next = false;
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') && trimmed.contains(task_name) {
            skip_next = true;
            continue;
        }
        if !trimmed.starts_with('#') && trimmed.contains(task_name) {
            continue;
        }
        kept.push(line);
    }
    let next = kept.join("\n");
    if next == current {
        None
    } else {
        Some(next)
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
