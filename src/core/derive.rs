//! View values computed from a snapshot.
//!
//! Nothing here is stored: views call these on every render so the derived
//! values can never drift from the snapshot they came from.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};

use super::api::{chapter_number, AgentLog, ProjectState, RetrievedChunkSummary};

/// Generated chapter numbers, ascending and without duplicates.
///
/// Keys that do not parse as a positive integer are discarded.
pub fn chapter_numbers(project: &ProjectState) -> Vec<u32> {
    let mut numbers: Vec<u32> = project
        .chapters
        .keys()
        .filter_map(|key| chapter_number(key))
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

/// Smallest positive chapter number with no generated text.
pub fn next_unwritten_chapter(project: &ProjectState) -> u32 {
    let mut next = 1;
    for n in chapter_numbers(project) {
        if n == next {
            next += 1;
        } else if n > next {
            break;
        }
    }
    next
}

/// Chunks grouped by recall channel, preserving their order within a group.
pub fn chunks_by_channel(chunks: &[RetrievedChunkSummary]) -> BTreeMap<&str, Vec<&RetrievedChunkSummary>> {
    let mut groups: BTreeMap<&str, Vec<&RetrievedChunkSummary>> = BTreeMap::new();
    for chunk in chunks {
        groups.entry(chunk.channel.as_str()).or_default().push(chunk);
    }
    groups
}

/// Agent logs, most recent first.
pub fn newest_first(logs: &[AgentLog]) -> impl Iterator<Item = &AgentLog> {
    logs.iter().rev()
}

/// Human-readable form of a backend timestamp, or the raw text when it is
/// neither RFC 3339 nor a naive ISO-8601 datetime.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}
