//! Timeline bucketing
//!
//! Partitions one calendar day's rows into a fixed count of equal-duration
//! slots and reduces each slot to a statistical summary. The day span is the
//! rows' timestamp extent, or the canonical work window when the day has no
//! rows; slot physiological levels normalize against the whole day's RMSSD
//! range so bucket-to-bucket comparisons stay meaningful within one day.

use chrono::{FixedOffset, NaiveDate};

use crate::config::{PipelineConfig, WorkWindow, DEFAULT_SLOT_COUNT};
use crate::stats;
use crate::types::{NormalizedFeatureRow, SlotSummary, TimelineBucket};

/// Options for one bucket-building request
#[derive(Debug, Clone, Copy)]
pub struct BucketOptions {
    /// Number of slots to partition the day into
    pub slot_count: usize,
    /// Fallback span for days without rows
    pub window: WorkWindow,
    /// Shift applied to the fallback window (ms)
    pub day_offset_ms: i64,
    /// Optional flag-code to display-label hook; unmapped codes are dropped
    /// when a mapper is installed, codes pass through raw when none is
    pub label_mapper: Option<fn(&str) -> Option<String>>,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            window: WorkWindow::default(),
            day_offset_ms: 0,
            label_mapper: None,
        }
    }
}

impl BucketOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            slot_count: config.slot_count.max(1),
            window: config.work_window,
            ..Self::default()
        }
    }
}

/// Bucketer partitioning one day's rows into timeline slots
pub struct TimelineBucketer;

impl TimelineBucketer {
    /// Build exactly `slot_count` contiguous buckets for one calendar day.
    ///
    /// Slot `i` covers `[start + i*span/N, start + (i+1)*span/N)`; the
    /// clamped assignment makes the last slot inclusive of the upper bound.
    pub fn build(
        rows: &[NormalizedFeatureRow],
        day: NaiveDate,
        offset: FixedOffset,
        options: &BucketOptions,
    ) -> Vec<TimelineBucket> {
        let slot_count = options.slot_count.max(1);

        let (start_ms, end_ms) = match stats::range(
            &rows.iter().map(|r| r.timestamp_ms as f64).collect::<Vec<_>>(),
        ) {
            Some(extent) => (extent.min as i64, extent.max as i64),
            None => window_span(day, offset, &options.window, options.day_offset_ms),
        };
        let span = (end_ms - start_ms).max(1);

        let mut buckets: Vec<TimelineBucket> = (0..slot_count)
            .map(|i| TimelineBucket {
                slot_index: i,
                start_ms: start_ms + (i as i64 * span) / slot_count as i64,
                end_ms: start_ms + ((i as i64 + 1) * span) / slot_count as i64,
                member_rows: Vec::new(),
                avg_perceived: None,
                avg_physiological: None,
                summary: SlotSummary::default(),
            })
            .collect();

        for row in rows {
            let raw_index = ((row.timestamp_ms - start_ms) * slot_count as i64) / span;
            let index = raw_index.clamp(0, slot_count as i64 - 1) as usize;
            buckets[index].member_rows.push(row.clone());
        }

        // slot physiological levels normalize against the day's row-level range
        let day_rmssd: Vec<f64> = rows.iter().filter_map(|r| r.rmssd).collect();
        let day_rmssd_range = stats::range(&day_rmssd);

        for bucket in &mut buckets {
            if bucket.member_rows.is_empty() {
                continue;
            }

            let perceived: Vec<f64> = bucket
                .member_rows
                .iter()
                .filter_map(|r| r.perceived_stress)
                .map(stats::clamp_survey)
                .collect();
            bucket.avg_perceived = stats::mean(&perceived);

            let slot_rmssd: Vec<f64> =
                bucket.member_rows.iter().filter_map(|r| r.rmssd).collect();
            bucket.avg_physiological = stats::mean(&slot_rmssd)
                .zip(day_rmssd_range)
                .and_then(|(mean, range)| stats::normalize(mean, &range))
                .map(|normalized| stats::level_from_unit(1.0 - normalized));

            bucket.summary = summarize(&bucket.member_rows, options.label_mapper);
        }

        buckets
    }
}

/// Canonical work window for `day`, shifted by `day_offset_ms`
fn window_span(
    day: NaiveDate,
    offset: FixedOffset,
    window: &WorkWindow,
    day_offset_ms: i64,
) -> (i64, i64) {
    let start = local_hour_ms(day, window.start_hour, offset) + day_offset_ms;
    let end = local_hour_ms(day, window.end_hour, offset) + day_offset_ms;
    (start, end)
}

fn local_hour_ms(day: NaiveDate, hour: u32, offset: FixedOffset) -> i64 {
    let naive = day
        .and_hms_opt(hour.min(23), 0, 0)
        .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN));
    naive.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000
}

fn summarize(
    rows: &[NormalizedFeatureRow],
    label_mapper: Option<fn(&str) -> Option<String>>,
) -> SlotSummary {
    let mean_of = |field: fn(&NormalizedFeatureRow) -> Option<f64>| {
        stats::mean_present(rows.iter().map(field))
    };

    let mut raised: Vec<&'static str> = Vec::new();
    for row in rows {
        for flag in &row.stressors {
            raised.push(flag.column());
        }
    }
    let stressor_count = raised.len();
    let codes = stats::dedup_stable(&raised);
    let stressor_labels = match label_mapper {
        Some(map) => codes.iter().filter_map(|code| map(code)).collect(),
        None => codes.iter().map(|code| code.to_string()).collect(),
    };

    SlotSummary {
        workload: mean_of(|r| r.workload),
        arousal: mean_of(|r| r.arousal),
        valence: mean_of(|r| r.valence),
        tiredness: mean_of(|r| r.tiredness),
        surface_acting: mean_of(|r| r.surface_acting),
        steps: mean_of(|r| r.steps),
        skin_temp: mean_of(|r| r.skin_temp),
        heart_rate_mean: mean_of(|r| r.heart_rate_mean),
        heart_rate_range: mean_of(|r| r.heart_rate_range),
        accel_mean: mean_of(|r| r.accel_mean),
        humidity: mean_of(|r| r.humidity),
        co2: mean_of(|r| r.co2),
        tvoc: mean_of(|r| r.tvoc),
        temperature: mean_of(|r| r.temperature),
        daily_arousal: mean_of(|r| r.daily_arousal),
        daily_valence: mean_of(|r| r.daily_valence),
        daily_tiredness: mean_of(|r| r.daily_tiredness),
        daily_general_health: mean_of(|r| r.daily_general_health),
        daily_general_sleep: mean_of(|r| r.daily_general_sleep),
        angry_call_count: rows.iter().filter(|r| r.call_type_angry).count(),
        stressor_count,
        stressor_labels,
    }
}
