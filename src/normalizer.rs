//! Row normalization
//!
//! This module converts loosely-typed feed rows into typed feature rows:
//! - Participant match and validity-flag filtering
//! - Every numeric cell coerced to finite-or-absent
//! - Canonical event timestamp and participant-local date key
//! - Derived heart-rate range and post-intervention fields

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::config::PipelineConfig;
use crate::filter;
use crate::schema::{columns, CellValue, RawRecord, StressorFlag};
use crate::types::NormalizedFeatureRow;

/// Epoch values below this are seconds, at or above it milliseconds
const EPOCH_MS_THRESHOLD: f64 = 1e12;

/// Normalizer for converting raw records into feature rows
pub struct RowNormalizer {
    offset: FixedOffset,
}

impl RowNormalizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            offset: config.offset(),
        }
    }

    /// Normalize one record; `None` drops the row.
    ///
    /// A row is dropped when its participant key does not match the
    /// requested one, when the validity flag is present and false, or when
    /// no event timestamp can be recovered.
    pub fn normalize(&self, record: &RawRecord, participant: &str) -> Option<NormalizedFeatureRow> {
        let key = filter::normalize_key(participant);
        if !key.is_empty() && filter::participant_key(record) != key {
            return None;
        }

        if let Some(valid) = record.get(columns::VALID) {
            if valid.is_present() && !valid.is_truthy() {
                return None;
            }
        }

        let timestamp_ms = record
            .first_present(columns::EVENT_TIME)
            .and_then(|cell| parse_time(cell, self.offset))?;
        let date_key = date_key(timestamp_ms, self.offset)?;

        let heart_rate_min = record.number(columns::HR_MIN);
        let heart_rate_max = record.number(columns::HR_MAX);
        let heart_rate_range = match (heart_rate_min, heart_rate_max) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        };

        let stressors: Vec<StressorFlag> = StressorFlag::ALL
            .iter()
            .copied()
            .filter(|flag| record.truthy(flag.column()))
            .collect();

        let (intervention_name, intervention_time_ms) =
            intervention_fields(record, timestamp_ms, self.offset);

        Some(NormalizedFeatureRow {
            participant_id: filter::participant_key(record),
            timestamp_ms,
            date_key,
            perceived_stress: record.number(columns::STRESS),
            rmssd: record.number(columns::RMSSD),
            workload: record.number(columns::WORKLOAD),
            arousal: record.number(columns::AROUSAL),
            valence: record.number(columns::VALENCE),
            tiredness: record.number_any(columns::TIREDNESS),
            surface_acting: record.number(columns::SURFACE_ACTING),
            call_type_angry: record.truthy(columns::CALL_TYPE_ANGRY),
            stressors,
            humidity: record.number(columns::HUMIDITY),
            co2: record.number(columns::CO2),
            tvoc: record.number(columns::TVOC),
            temperature: record.number(columns::TEMPERATURE),
            steps: record.number(columns::STEPS),
            skin_temp: record.number_any(columns::SKIN_TEMP),
            heart_rate_min,
            heart_rate_max,
            heart_rate_mean: record.number(columns::HR_MEAN),
            heart_rate_range,
            accel_mean: record.number(columns::ACC_MEAN),
            accel_std: record.number(columns::ACC_STD),
            daily_arousal: record.number(columns::DAILY_AROUSAL),
            daily_valence: record.number(columns::DAILY_VALENCE),
            daily_tiredness: record.number(columns::DAILY_TIREDNESS),
            daily_general_health: record.number(columns::DAILY_GENERAL_HEALTH),
            daily_general_sleep: record.number(columns::DAILY_GENERAL_SLEEP),
            call_time_ms: record
                .get(columns::CALLS)
                .and_then(|cell| parse_time(cell, self.offset)),
            intervention_name,
            intervention_time_ms,
        })
    }

    /// Normalize a batch, dropping rows that fail the contract
    pub fn normalize_all(
        &self,
        records: &[RawRecord],
        participant: &str,
    ) -> Vec<NormalizedFeatureRow> {
        records
            .iter()
            .filter_map(|record| self.normalize(record, participant))
            .collect()
    }
}

/// Intervention name/time for post-intervention survey rows, absent otherwise
fn intervention_fields(
    record: &RawRecord,
    timestamp_ms: i64,
    offset: FixedOffset,
) -> (Option<String>, Option<i64>) {
    let survey_type = record.text(columns::SURVEY_TYPE);
    if survey_type.as_deref().map(str::trim) != Some(columns::SURVEY_TYPE_POST_INTERVENTION) {
        return (None, None);
    }
    let name = record
        .text_any(columns::INTERVENTION_NAME)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    match name {
        Some(name) => {
            let time_ms = record
                .get(columns::INTERVENTION_TIME)
                .and_then(|cell| parse_time(cell, offset))
                .unwrap_or(timestamp_ms);
            (Some(name), Some(time_ms))
        }
        None => (None, None),
    }
}

/// Parse a time cell to epoch milliseconds.
///
/// Numbers below 1e12 are epoch seconds, otherwise epoch milliseconds.
/// Strings parse as a number first, then as RFC 3339, then as a naive
/// datetime in the observer's offset.
pub fn parse_time(cell: &CellValue, offset: FixedOffset) -> Option<i64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(scale_epoch(*n)),
        CellValue::Integer(i) => Some(scale_epoch(*i as f64)),
        CellValue::String(s) => {
            let text = s.trim();
            if text.is_empty() {
                return None;
            }
            if let Ok(n) = text.parse::<f64>() {
                return n.is_finite().then(|| scale_epoch(n));
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.timestamp_millis());
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                    return Some(local_to_epoch_ms(naive, offset));
                }
            }
            None
        }
        _ => None,
    }
}

fn scale_epoch(value: f64) -> i64 {
    if value < EPOCH_MS_THRESHOLD {
        (value * 1000.0) as i64
    } else {
        value as i64
    }
}

fn local_to_epoch_ms(naive: NaiveDateTime, offset: FixedOffset) -> i64 {
    naive.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000
}

/// Format a timestamp as `YYYY-MM-DD` in the observer's calendar
pub fn date_key(timestamp_ms: i64, offset: FixedOffset) -> Option<String> {
    let dt = DateTime::from_timestamp_millis(timestamp_ms)?;
    Some(dt.with_timezone(&offset).format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(pid: &str, timestamp_ms: i64) -> RawRecord {
        let mut record = RawRecord::new();
        record.set("pid", pid);
        record.set("windowStartTime", timestamp_ms);
        record
    }

    fn make_normalizer(offset_minutes: i32) -> RowNormalizer {
        RowNormalizer::new(&PipelineConfig::with_offset_minutes(offset_minutes))
    }

    #[test]
    fn test_participant_mismatch_drops_row() {
        let normalizer = make_normalizer(0);
        let record = make_record("p01", 1_752_130_000_000);
        assert!(normalizer.normalize(&record, "p02").is_none());
        assert!(normalizer.normalize(&record, "p01").is_some());
        assert!(normalizer.normalize(&record, "").is_some());
    }

    #[test]
    fn test_validity_flag_present_and_false_drops_row() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("valid", false);
        assert!(normalizer.normalize(&record, "p01").is_none());

        record.set("valid", "True");
        assert!(normalizer.normalize(&record, "p01").is_some());
    }

    #[test]
    fn test_missing_event_time_drops_row() {
        let normalizer = make_normalizer(0);
        let mut record = RawRecord::new();
        record.set("pid", "p01");
        record.set("stress", 2i64);
        assert!(normalizer.normalize(&record, "p01").is_none());
    }

    #[test]
    fn test_event_time_synonyms_in_preference_order() {
        let normalizer = make_normalizer(0);
        let mut record = RawRecord::new();
        record.set("pid", "p01");
        record.set("surveyTime", 1_752_130_000i64);
        record.set("callEndTime", 1_752_999_999i64);
        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.timestamp_ms, 1_752_130_000_000);
    }

    #[test]
    fn test_epoch_seconds_scale_to_milliseconds() {
        let offset = PipelineConfig::default().offset();
        let seconds = CellValue::Integer(1_752_130_000);
        let millis = CellValue::Integer(1_752_130_000_000);
        assert_eq!(parse_time(&seconds, offset), Some(1_752_130_000_000));
        assert_eq!(parse_time(&millis, offset), Some(1_752_130_000_000));
    }

    #[test]
    fn test_string_time_parsing() {
        let offset = PipelineConfig::default().offset();
        assert_eq!(
            parse_time(&CellValue::from("1752130000"), offset),
            Some(1_752_130_000_000)
        );
        assert_eq!(
            parse_time(&CellValue::from("2025-07-10T06:46:40+00:00"), offset),
            Some(1_752_130_000_000)
        );
        assert_eq!(
            parse_time(&CellValue::from("2025-07-10T06:46:40"), offset),
            Some(1_752_130_000_000)
        );
        assert_eq!(parse_time(&CellValue::from("garbage"), offset), None);
    }

    #[test]
    fn test_local_midnight_straddle_lands_in_different_date_keys() {
        // UTC+9: 14:55 and 15:05 UTC straddle local midnight
        let normalizer = make_normalizer(540);
        let before = normalizer
            .normalize(&make_record("p01", 1_752_159_300_000), "p01")
            .unwrap();
        let after = normalizer
            .normalize(&make_record("p01", 1_752_159_900_000), "p01")
            .unwrap();
        assert_eq!(before.date_key, "2025-07-10");
        assert_eq!(after.date_key, "2025-07-11");
    }

    #[test]
    fn test_invalid_numerics_become_absent() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("stress", "oops");
        record.set("rmssd", 48.5);
        record.set("workload", "");

        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.perceived_stress, None);
        assert_eq!(row.rmssd, Some(48.5));
        assert_eq!(row.workload, None);
    }

    #[test]
    fn test_heart_rate_range_needs_both_operands() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("hr_min", 60.0);
        record.set("hr_max", 95.0);
        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.heart_rate_range, Some(35.0));

        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("hr_max", 95.0);
        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.heart_rate_range, None);
    }

    #[test]
    fn test_stressor_flags_collect_in_catalog_order() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("stressor_noise", 1i64);
        record.set("stressor_lack_ability", "1");
        record.set("stressor_time_pressure", 0i64);

        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(
            row.stressors,
            vec![StressorFlag::LackAbility, StressorFlag::Noise]
        );
    }

    #[test]
    fn test_post_intervention_rows_populate_intervention_fields() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("survey_type", "post_intervention");
        record.set("interventionName", " breathe ");
        record.set("interventionTime", 1_752_131_000i64);

        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.intervention_name.as_deref(), Some("breathe"));
        assert_eq!(row.intervention_time_ms, Some(1_752_131_000_000));
    }

    #[test]
    fn test_intervention_time_falls_back_to_row_timestamp() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("survey_type", "post_intervention");
        record.set("intervention", "stretch");

        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.intervention_name.as_deref(), Some("stretch"));
        assert_eq!(row.intervention_time_ms, Some(1_752_130_000_000));
    }

    #[test]
    fn test_non_intervention_rows_leave_fields_absent() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        record.set("interventionName", "breathe");

        let row = normalizer.normalize(&record, "p01").unwrap();
        assert_eq!(row.intervention_name, None);
        assert_eq!(row.intervention_time_ms, None);
    }

    #[test]
    fn test_no_nan_ever_reaches_a_numeric_field() {
        let normalizer = make_normalizer(0);
        let mut record = make_record("p01", 1_752_130_000_000);
        for col in [
            "stress", "rmssd", "workload", "arousal", "valence", "tiredness",
            "surface_acting", "humidity_mean", "co2_mean", "tvoc_mean",
            "temperature_mean", "steps", "skintemp", "hr_min", "hr_max",
            "hr_mean", "acc_mean", "acc_std",
        ] {
            record.set(col, "NaN-ish");
        }
        let row = normalizer.normalize(&record, "p01").unwrap();
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("null"));
        assert_eq!(row.rmssd, None);
        assert_eq!(row.heart_rate_range, None);
    }
}
