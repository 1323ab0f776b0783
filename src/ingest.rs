//! Row ingestion boundary
//!
//! Fetch-and-parse is an external collaborator's concern; this module
//! defines the trait seam it plugs into, two simple implementations for
//! embedding and tests, and the load-ticket guard that discards superseded
//! requests instead of merging stale results.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::PipelineError;
use crate::filter;
use crate::schema::RawRecord;

/// The three independent tabular feeds the core consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Feature,
    Difference,
    Correlation,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Feature => "feature",
            Feed::Difference => "difference",
            Feed::Correlation => "correlation",
        }
    }
}

/// A source of already-parsed feed rows
pub trait RowSource {
    /// Fetch one origin's rows; fails with a transport or parse error
    fn rows(&self, origin: &str) -> Result<Vec<RawRecord>, PipelineError>;
}

/// In-memory source for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    feeds: HashMap<String, Vec<RawRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, origin: &str, records: Vec<RawRecord>) -> &mut Self {
        self.feeds.insert(origin.to_string(), records);
        self
    }
}

impl RowSource for MemorySource {
    fn rows(&self, origin: &str) -> Result<Vec<RawRecord>, PipelineError> {
        self.feeds
            .get(origin)
            .cloned()
            .ok_or_else(|| PipelineError::FetchError(format!("unknown origin: {origin}")))
    }
}

/// Source backed by JSON payloads (one JSON row array per origin)
#[derive(Debug, Clone, Default)]
pub struct JsonSource {
    payloads: HashMap<String, String>,
}

impl JsonSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, origin: &str, json: &str) -> &mut Self {
        self.payloads.insert(origin.to_string(), json.to_string());
        self
    }
}

impl RowSource for JsonSource {
    fn rows(&self, origin: &str) -> Result<Vec<RawRecord>, PipelineError> {
        let payload = self
            .payloads
            .get(origin)
            .ok_or_else(|| PipelineError::FetchError(format!("unknown origin: {origin}")))?;
        records_from_json(payload)
    }
}

/// Parse a JSON array of header-keyed row objects
pub fn records_from_json(json: &str) -> Result<Vec<RawRecord>, PipelineError> {
    Ok(serde_json::from_str(json)?)
}

/// One outstanding load request, keyed to its inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: Uuid,
    pub feed: Feed,
    pub origin: String,
    pub participant: String,
}

/// Tracks the newest ticket per feed; beginning a new load invalidates
/// outstanding tickets for that feed
#[derive(Debug, Clone, Default)]
pub struct LoadGuard {
    current: HashMap<Feed, Uuid>,
}

impl LoadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a load, superseding any outstanding ticket for the feed
    pub fn begin(&mut self, feed: Feed, origin: &str, participant: &str) -> LoadTicket {
        let id = Uuid::new_v4();
        self.current.insert(feed, id);
        LoadTicket {
            id,
            feed,
            origin: origin.to_string(),
            participant: filter::normalize_key(participant),
        }
    }

    /// Whether the ticket is still the newest load for its feed
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.current.get(&ticket.feed) == Some(&ticket.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_source_parses_row_array() {
        let json = r#"[{"pid": "p01", "stress": 2}, {"pid": "p02", "stress": "3"}]"#;
        let mut source = JsonSource::new();
        source.insert("feature_full", json);

        let records = source.rows("feature_full").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number("stress"), Some(2.0));
        assert_eq!(records[1].number("stress"), Some(3.0));
    }

    #[test]
    fn test_json_source_surfaces_parse_errors() {
        let mut source = JsonSource::new();
        source.insert("bad", "{not json");
        assert!(matches!(
            source.rows("bad"),
            Err(PipelineError::JsonError(_))
        ));
    }

    #[test]
    fn test_unknown_origin_is_a_fetch_error() {
        let source = MemorySource::new();
        assert!(matches!(
            source.rows("missing"),
            Err(PipelineError::FetchError(_))
        ));
    }

    #[test]
    fn test_new_load_supersedes_outstanding_ticket() {
        let mut guard = LoadGuard::new();
        let first = guard.begin(Feed::Feature, "a", "p01");
        assert!(guard.is_current(&first));

        let second = guard.begin(Feed::Feature, "a", "p02");
        assert!(!guard.is_current(&first));
        assert!(guard.is_current(&second));
    }

    #[test]
    fn test_feeds_supersede_independently() {
        let mut guard = LoadGuard::new();
        let feature = guard.begin(Feed::Feature, "a", "p01");
        let correlation = guard.begin(Feed::Correlation, "a", "p01");
        assert!(guard.is_current(&feature));
        assert!(guard.is_current(&correlation));
    }
}
