//! Core types for the stresslens pipeline
//!
//! This module defines the data structures that flow through each stage:
//! normalized feature rows, daily stress records, timeline buckets, grouped
//! correlations, and intervention effects. Every numeric attribute is either
//! a finite number or explicitly absent.

use serde::{Deserialize, Serialize};

use crate::schema::StressorFlag;

/// The two stress dimensions every view is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressDimension {
    /// Self-reported stress from survey responses (0-4)
    Perceived,
    /// RMSSD-derived autonomic stress proxy
    Physiological,
}

impl StressDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressDimension::Perceived => "perceived",
            StressDimension::Physiological => "physiological",
        }
    }
}

/// Feature name prefix that force-classifies a feature as pre-shift
pub const PRE_SHIFT_FEATURE_PREFIX: &str = "daily_";

/// Top-level category a correlated feature belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stressor,
    Environment,
    WorkContext,
    PreShift,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Stressor,
        Category::Environment,
        Category::WorkContext,
        Category::PreShift,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stressor => "stressor",
            Category::Environment => "environment",
            Category::WorkContext => "work_context",
            Category::PreShift => "pre_shift",
            Category::Other => "other",
        }
    }

    /// Classify a feature into its top-level category.
    ///
    /// The `daily_` feature-name prefix wins over the stated category label;
    /// labels compare trimmed and case-insensitively. This is the single
    /// classification routine used by every grouping component.
    pub fn classify(feature: &str, category_label: &str) -> Category {
        if feature.trim().starts_with(PRE_SHIFT_FEATURE_PREFIX) {
            return Category::PreShift;
        }
        match category_label.trim().to_lowercase().as_str() {
            "stressor" => Category::Stressor,
            "env" | "environment" => Category::Environment,
            "context" => Category::WorkContext,
            "daily_context" | "pre_shift" => Category::PreShift,
            _ => Category::Other,
        }
    }
}

/// One typed, bounds-checked survey/sensor sample, owned by one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureRow {
    pub participant_id: String,
    /// Canonical event time (epoch milliseconds)
    pub timestamp_ms: i64,
    /// Participant-local calendar date, `YYYY-MM-DD`
    pub date_key: String,

    /// Self-reported stress (0-4)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_stress: Option<f64>,
    /// Heart-rate variability (RMSSD, ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmssd: Option<f64>,

    // Contextual survey numerics (0-5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arousal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiredness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_acting: Option<f64>,

    /// Preceding call was a complaint call
    #[serde(default)]
    pub call_type_angry: bool,
    /// Stressor flags raised by this row, in catalog order
    #[serde(default)]
    pub stressors: Vec<StressorFlag>,

    // Environment numerics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvoc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    // Physiological numerics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_mean: Option<f64>,
    /// Derived: max - min, only when both operands are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_std: Option<f64>,

    // Pre-shift daily survey numerics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_arousal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_tiredness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_general_health: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_general_sleep: Option<f64>,

    /// Call-log timestamp carried on the row (epoch ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_time_ms: Option<i64>,

    /// Populated only on post-intervention survey rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_time_ms: Option<i64>,
}

/// One intervention taken on a given day (timeline overlay feed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub name: String,
    pub time_ms: i64,
}

/// Aggregate stress indicator for one participant-day.
///
/// An absent raw quantizes to level 0 with the raw field left absent;
/// callers check presence, not the zero level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStressRecord {
    pub participant_id: String,
    pub date_key: String,
    /// Perceived stress level, 0-4
    pub perceived_level: u8,
    /// Physiological stress level, 0-4
    pub physiological_level: u8,
    /// Mean of the day's perceived-stress responses (0-4 domain)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_raw: Option<f64>,
    /// Inverted normalized day RMSSD mean (0-1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physiological_raw: Option<f64>,
    pub sample_count: usize,
}

/// Per-slot statistical summary of the member rows.
///
/// Empty slots leave every field absent; the visualization renders those as
/// "no data", not as level 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workload: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arousal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiredness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_acting: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate_range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvoc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_arousal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_valence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_tiredness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_general_health: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_general_sleep: Option<f64>,

    /// Member rows whose preceding call was a complaint call
    #[serde(default)]
    pub angry_call_count: usize,
    /// Total stressor flags raised across member rows
    #[serde(default)]
    pub stressor_count: usize,
    /// Deduplicated, order-stable triggered stressor labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stressor_labels: Vec<String>,
}

/// One fixed-duration segment of a day's timeline.
///
/// Slot intervals are half-open, contiguous, and non-overlapping; the last
/// slot is inclusive of the span's upper bound by clamped assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub slot_index: usize,
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_rows: Vec<NormalizedFeatureRow>,
    /// Mean of present perceived-stress values, clamped to 0-4 before averaging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_perceived: Option<f64>,
    /// Slot RMSSD mean normalized against the whole day's range, inverted,
    /// quantized to a 0-4 level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_physiological: Option<u8>,
    pub summary: SlotSummary,
}

/// One feature's correlation against a stress dimension, scaled for
/// area-based visual encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationDatum {
    pub feature: String,
    /// `|correlation| * 100`
    pub magnitude: f64,
    /// The original signed coefficient
    pub signed_raw: f64,
}

/// A named intra-category group of correlation data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationGroup {
    pub name: String,
    pub data: Vec<CorrelationDatum>,
}

/// Per-dimension group lists within one top-level category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionSeries {
    pub perceived: Vec<CorrelationGroup>,
    pub physiological: Vec<CorrelationGroup>,
}

impl DimensionSeries {
    pub fn groups(&self, dimension: StressDimension) -> &[CorrelationGroup] {
        match dimension {
            StressDimension::Perceived => &self.perceived,
            StressDimension::Physiological => &self.physiological,
        }
    }

    pub fn groups_mut(&mut self, dimension: StressDimension) -> &mut Vec<CorrelationGroup> {
        match dimension {
            StressDimension::Perceived => &mut self.perceived,
            StressDimension::Physiological => &mut self.physiological,
        }
    }
}

/// Correlation series grouped by top-level category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedCorrelations {
    pub stressor: DimensionSeries,
    pub environment: DimensionSeries,
    pub work_context: DimensionSeries,
    pub pre_shift: DimensionSeries,
    pub other: DimensionSeries,
}

impl GroupedCorrelations {
    pub fn series(&self, category: Category) -> &DimensionSeries {
        match category {
            Category::Stressor => &self.stressor,
            Category::Environment => &self.environment,
            Category::WorkContext => &self.work_context,
            Category::PreShift => &self.pre_shift,
            Category::Other => &self.other,
        }
    }

    pub fn series_mut(&mut self, category: Category) -> &mut DimensionSeries {
        match category {
            Category::Stressor => &mut self.stressor,
            Category::Environment => &mut self.environment,
            Category::WorkContext => &mut self.work_context,
            Category::PreShift => &mut self.pre_shift,
            Category::Other => &mut self.other,
        }
    }
}

/// Mean pre/post effect of one stress-relief activity.
///
/// A dimension with zero present diff values reports a mean of 0.0, not
/// absent; callers drop non-finite entries before display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionEffect {
    pub name: String,
    pub perceived_diff: f64,
    pub physiological_diff: f64,
    pub sample_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_category_label() {
        assert_eq!(Category::classify("rmssd", "stressor"), Category::Stressor);
        assert_eq!(Category::classify("co2_mean", " ENV "), Category::Environment);
        assert_eq!(Category::classify("co2_mean", "environment"), Category::Environment);
        assert_eq!(Category::classify("workload", "Context"), Category::WorkContext);
        assert_eq!(Category::classify("sleep", "daily_context"), Category::PreShift);
        assert_eq!(Category::classify("foo", "mystery"), Category::Other);
        assert_eq!(Category::classify("foo", ""), Category::Other);
    }

    #[test]
    fn test_prefix_override_wins_over_label() {
        assert_eq!(Category::classify("daily_stress", "Context"), Category::PreShift);
        assert_eq!(Category::classify("daily_general_sleep", "stressor"), Category::PreShift);
    }

    #[test]
    fn test_absent_fields_are_skipped_in_json() {
        let record = DailyStressRecord {
            participant_id: "p01".to_string(),
            date_key: "2025-07-10".to_string(),
            perceived_level: 0,
            physiological_level: 0,
            perceived_raw: None,
            physiological_raw: None,
            sample_count: 0,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("perceived_raw"));
        assert!(!json.contains("physiological_raw"));
    }
}
