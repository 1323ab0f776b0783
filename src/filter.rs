//! Participant filtering
//!
//! Identity keys compare after trimming and string coercion; an empty or
//! missing requested key is a pass-through.

use crate::schema::{columns, RawRecord};

/// Canonical form of a participant key: trimmed string
pub fn normalize_key(key: &str) -> String {
    key.trim().to_string()
}

/// The participant key a raw record carries, empty when none
pub fn participant_key(record: &RawRecord) -> String {
    record
        .text_any(columns::PARTICIPANT)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Narrow records to one participant; an empty key keeps everything
pub fn filter_records<'a>(records: &'a [RawRecord], participant: &str) -> Vec<&'a RawRecord> {
    let key = normalize_key(participant);
    if key.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| participant_key(record) == key)
        .collect()
}
