// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::job::JobId;

#[test]
fn generated_ids_carry_the_type_prefix() {
    let id = JobId::new();
    assert!(id.as_str().starts_with("job-"));
    assert_eq!(id.as_str().len(), "job-".len() + crate::id::ID_SUFFIX_LEN);
}

#[test]
fn generated_ids_are_unique() {
    let a = JobId::new();
    let b = JobId::new();
    assert_ne!(a, b);
}

#[test]
fn id_round_trips_through_serde_as_a_bare_string() {
    let id = JobId::from_string("job-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"job-abc\"");

    let parsed: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn id_compares_against_str() {
    let id = JobId::from_string("job-1");
    assert_eq!(id, "job-1");
    assert_ne!(id, "job-2");
}

#[test]
fn short_truncates() {
    assert_eq!(crate::id::short("abcdef", 3), "abc");
    assert_eq!(crate::id::short("ab", 3), "ab");
}
