// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::Phase;

fn ts() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[test]
fn default_levels_match_source_table() {
    assert_eq!(EventType::JobCreated.default_level(), EventLevel::Info);
    assert_eq!(EventType::StaleDetected.default_level(), EventLevel::Warning);
    assert_eq!(EventType::JobFailed.default_level(), EventLevel::Error);
    assert_eq!(EventType::DeadLettered.default_level(), EventLevel::Error);
}

#[test]
fn new_event_uses_default_level() {
    let ev = Event::new(ts(), EventType::JobCreated, Phase::Search, "created");
    assert_eq!(ev.level, EventLevel::Info);
}

#[test]
fn with_level_overrides_default() {
    let ev = Event::new(ts(), EventType::JobCreated, Phase::Search, "created")
        .with_level(EventLevel::Error);
    assert_eq!(ev.level, EventLevel::Error);
}

#[test]
fn with_field_inserts_structured_data() {
    let ev = Event::new(ts(), EventType::StaleDetected, Phase::Ranking, "stale")
        .with_field("stale_minutes", 42);
    assert_eq!(ev.fields.get("stale_minutes"), Some(&serde_json::json!(42)));
}

#[test]
fn append_is_fifo_under_cap() {
    let mut log = Vec::new();
    for i in 0..5 {
        append(
            &mut log,
            Event::new(ts(), EventType::JobCreated, Phase::Search, format!("e{i}")),
            3,
        );
    }
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].message, "e2");
    assert_eq!(log[2].message, "e4");
}

#[test]
fn append_never_exceeds_max_even_on_first_insert() {
    let mut log = Vec::new();
    append(
        &mut log,
        Event::new(ts(), EventType::JobCreated, Phase::Search, "only"),
        0,
    );
    assert!(log.is_empty());
}

#[test]
fn event_serde_round_trip() {
    let ev = Event::new(ts(), EventType::JobCompleted, Phase::Report, "done")
        .with_field("artifact_count", 3);
    let json = serde_json::to_string(&ev).expect("serialize");
    let back: Event = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ev, back);
}
