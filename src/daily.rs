//! Daily aggregation
//!
//! Groups normalized rows by participant-local calendar date and reduces
//! each group to one daily stress record. The physiological normalization
//! range derives from the set of per-day RMSSD means, not from individual
//! rows. Everything here is a full recomputation on every invocation.

use std::collections::BTreeMap;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::effects::DifferenceRow;
use crate::normalizer::date_key;
use crate::stats;
use crate::types::{DailyStressRecord, NormalizedFeatureRow};

#[derive(Default)]
struct DayAccum {
    participant_id: String,
    perceived: Vec<f64>,
    rmssd: Vec<f64>,
    count: usize,
}

/// Aggregator producing one record per distinct date key
pub struct DailyAggregator;

impl DailyAggregator {
    /// Reduce one participant's normalized rows to daily stress records,
    /// sorted by date key
    pub fn aggregate(rows: &[NormalizedFeatureRow]) -> Vec<DailyStressRecord> {
        let mut days: BTreeMap<String, DayAccum> = BTreeMap::new();
        for row in rows {
            let accum = days.entry(row.date_key.clone()).or_insert_with(|| DayAccum {
                participant_id: row.participant_id.clone(),
                ..DayAccum::default()
            });
            accum.count += 1;
            if let Some(v) = row.perceived_stress {
                accum.perceived.push(v);
            }
            if let Some(v) = row.rmssd {
                accum.rmssd.push(v);
            }
        }

        // normalization range over the per-day means, not individual rows
        let day_rmssd_means: Vec<Option<f64>> =
            days.values().map(|day| stats::mean(&day.rmssd)).collect();
        let present_means: Vec<f64> = day_rmssd_means.iter().flatten().copied().collect();
        let rmssd_range = stats::range(&present_means);

        days.iter()
            .zip(day_rmssd_means)
            .map(|((date_key, accum), day_rmssd_mean)| {
                let perceived_raw = stats::mean(&accum.perceived);
                let physiological_raw = day_rmssd_mean
                    .zip(rmssd_range)
                    .and_then(|(mean, range)| stats::normalize(mean, &range))
                    .map(|normalized| 1.0 - normalized);

                DailyStressRecord {
                    participant_id: accum.participant_id.clone(),
                    date_key: date_key.clone(),
                    perceived_level: perceived_raw.map(stats::level_from_survey).unwrap_or(0),
                    physiological_level: physiological_raw
                        .map(stats::level_from_unit)
                        .unwrap_or(0),
                    perceived_raw,
                    physiological_raw,
                    sample_count: accum.count,
                }
            })
            .collect()
    }
}

/// One participant-day of the difference feed (diff calendar view).
///
/// Levels are signed: negative denotes a day where stress decreased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDiffRecord {
    pub date_key: String,
    pub perceived_level: i8,
    pub physiological_level: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_raw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physiological_raw: Option<f64>,
    pub sample_count: usize,
}

/// Reduce difference rows to per-day mean diffs, sorted by date key.
///
/// The physiological raw normalizes each per-day mean by the absolute
/// maximum of the cross-day per-day means, keeping the sign.
pub fn aggregate_diffs(rows: &[DifferenceRow], offset: FixedOffset) -> Vec<DailyDiffRecord> {
    let mut days: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let Some(timestamp_ms) = row.timestamp_ms else {
            continue;
        };
        let Some(key) = date_key(timestamp_ms, offset) else {
            continue;
        };
        let entry = days.entry(key).or_default();
        if let Some(v) = row.perceived_diff {
            entry.0.push(v);
        }
        if let Some(v) = row.physiological_diff {
            entry.1.push(v);
        }
    }

    let day_physiological_means: Vec<Option<f64>> =
        days.values().map(|(_, physio)| stats::mean(physio)).collect();
    let present_means: Vec<f64> = day_physiological_means.iter().flatten().copied().collect();
    let abs_max = stats::range(&present_means)
        .map(|range| range.min.abs().max(range.max.abs()))
        .filter(|m| *m > 0.0);

    days.iter()
        .zip(day_physiological_means)
        .map(|((date_key, (perceived, _)), day_mean)| {
            let perceived_raw = stats::mean(perceived);
            let physiological_raw = day_mean.zip(abs_max).map(|(mean, max)| mean / max);

            DailyDiffRecord {
                date_key: date_key.clone(),
                perceived_level: perceived_raw
                    .map(|raw| raw.round().clamp(-4.0, 4.0) as i8)
                    .unwrap_or(0),
                physiological_level: physiological_raw
                    .map(stats::signed_level_from_unit)
                    .unwrap_or(0),
                perceived_raw,
                physiological_raw,
                sample_count: perceived.len(),
            }
        })
        .collect()
}
