//! Unmatched-trigger records: fingerprints that reached the matcher with no
//! rule attached, kept for the suggestion derivation pass and surfaced to
//! operators so they can author a rule for them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnmatchedRecord {
    pub fingerprint: String,
    pub room: String,
    pub timestamp: String,
}

/// A candidate rule suggestion derived from repeated unmatched fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub fingerprint: String,
    pub occurrence_count: usize,
    pub last_seen: String,
}

/// Group unmatched records by fingerprint and rank by frequency, breaking
/// ties by recency. `limit` bounds the returned list to the top candidates.
pub fn derive_suggestions(records: &[UnmatchedRecord], limit: usize) -> Vec<Suggestion> {
    let mut grouped: HashMap<&str, (usize, &str, &str)> = HashMap::new();
    for record in records {
        let entry = grouped
            .entry(record.fingerprint.as_str())
            .or_insert((0, record.room.as_str(), record.timestamp.as_str()));
        entry.0 += 1;
        if record.timestamp.as_str() > entry.2 {
            entry.2 = record.timestamp.as_str();
        }
    }

    let mut suggestions: Vec<Suggestion> = grouped
        .into_iter()
        .map(|(fingerprint, (count, _room, last_seen))| Suggestion {
            fingerprint: fingerprint.to_string(),
            occurrence_count: count,
            last_seen: last_seen.to_string(),
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.occurrence_count
            .cmp(&a.occurrence_count)
            .then_with(|| b.last_seen.cmp(&a.last_seen))
    });
    suggestions.truncate(limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fp: &str, ts: &str) -> UnmatchedRecord {
        UnmatchedRecord {
            fingerprint: fp.into(),
            room: "kitchen".into(),
            timestamp: ts.into(),
        }
    }

    #[test]
    fn ranks_by_count_then_recency() {
        let records = vec![
            record("kitchen|08-09", "2024-01-01T08:00:00Z"),
            record("kitchen|08-09", "2024-01-02T08:00:00Z"),
            record("kitchen|09-10", "2024-01-03T09:00:00Z"),
        ];
        let suggestions = derive_suggestions(&records, 5);
        assert_eq!(suggestions[0].fingerprint, "kitchen|08-09");
        assert_eq!(suggestions[0].occurrence_count, 2);
        assert_eq!(suggestions[0].last_seen, "2024-01-02T08:00:00Z");
        assert_eq!(suggestions[1].fingerprint, "kitchen|09-10");
    }

    #[test]
    fn truncates_to_limit() {
        let records = vec![
            record("a", "2024-01-01T00:00:00Z"),
            record("b", "2024-01-01T00:00:00Z"),
            record("c", "2024-01-01T00:00:00Z"),
        ];
        assert_eq!(derive_suggestions(&records, 2).len(), 2);
    }
}
