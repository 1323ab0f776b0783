//! Intervention effect aggregation
//!
//! Parses the pre/post difference feed and reduces it to one mean effect per
//! stress-relief activity and dimension, in first-seen order.

use std::collections::HashMap;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::filter;
use crate::normalizer::parse_time;
use crate::schema::{columns, RawRecord};
use crate::types::InterventionEffect;

/// Bucket for rows whose intervention name is empty or missing
pub const UNKNOWN_INTERVENTION: &str = "(unknown)";

/// One pre/post stress-relief measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRow {
    pub participant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    pub intervention_name: String,
    /// Signed perceived-stress change; negative denotes reduction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_diff: Option<f64>,
    /// Signed physiological-stress change; negative denotes reduction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physiological_diff: Option<f64>,
}

/// Parse difference-feed records; cell-level failures become absence
pub fn parse_difference_records(records: &[RawRecord], offset: FixedOffset) -> Vec<DifferenceRow> {
    records
        .iter()
        .map(|record| DifferenceRow {
            participant_id: filter::participant_key(record),
            timestamp_ms: record
                .first_present(columns::EVENT_TIME)
                .and_then(|cell| parse_time(cell, offset)),
            intervention_name: record
                .text_any(columns::INTERVENTION_NAME)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            perceived_diff: record.number(columns::PERCEIVED_DIFF),
            physiological_diff: record.number(columns::PHYSIO_DIFF),
        })
        .collect()
}

#[derive(Default)]
struct EffectAccum {
    perceived_sum: f64,
    perceived_count: usize,
    physiological_sum: f64,
    physiological_count: usize,
    samples: usize,
}

/// Aggregator grouping difference rows by intervention name
pub struct InterventionEffectAggregator;

impl InterventionEffectAggregator {
    /// Mean effect per intervention, in first-seen order.
    ///
    /// A dimension with zero present values reports a mean of 0.0.
    pub fn aggregate(rows: &[DifferenceRow], participant: &str) -> Vec<InterventionEffect> {
        let key = filter::normalize_key(participant);
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, EffectAccum> = HashMap::new();

        for row in rows {
            if !key.is_empty() && row.participant_id != key {
                continue;
            }
            let name = if row.intervention_name.is_empty() {
                UNKNOWN_INTERVENTION.to_string()
            } else {
                row.intervention_name.clone()
            };
            let accum = groups.entry(name.clone()).or_insert_with(|| {
                order.push(name);
                EffectAccum::default()
            });
            accum.samples += 1;
            if let Some(v) = row.perceived_diff {
                accum.perceived_sum += v;
                accum.perceived_count += 1;
            }
            if let Some(v) = row.physiological_diff {
                accum.physiological_sum += v;
                accum.physiological_count += 1;
            }
        }

        order
            .into_iter()
            .map(|name| {
                let accum = &groups[&name];
                InterventionEffect {
                    perceived_diff: if accum.perceived_count > 0 {
                        accum.perceived_sum / accum.perceived_count as f64
                    } else {
                        0.0
                    },
                    physiological_diff: if accum.physiological_count > 0 {
                        accum.physiological_sum / accum.physiological_count as f64
                    } else {
                        0.0
                    },
                    sample_count: accum.samples,
                    name,
                }
            })
            .collect()
    }
}
