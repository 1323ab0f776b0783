//! Correlation grouping
//!
//! Parses the per-feature correlation feed and groups it by top-level
//! category and intra-category group name, producing magnitude-scaled series
//! for size-encoded visuals. Classification goes through the single
//! `Category::classify` routine; the `daily_` feature prefix wins over the
//! stated category column.

use serde::{Deserialize, Serialize};

use crate::filter;
use crate::schema::{columns, RawRecord};
use crate::types::{
    Category, CorrelationDatum, CorrelationGroup, GroupedCorrelations, StressDimension,
    PRE_SHIFT_FEATURE_PREFIX,
};

/// One (participant, feature) pair of the correlation feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    pub participant_id: String,
    pub feature: String,
    pub category: String,
    /// Signed correlation against perceived stress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived: Option<f64>,
    /// Signed correlation against the physiological proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physiological: Option<f64>,
}

/// Parse correlation-feed records; non-finite coefficients become absence
pub fn parse_correlation_records(records: &[RawRecord]) -> Vec<CorrelationRow> {
    records
        .iter()
        .map(|record| CorrelationRow {
            participant_id: filter::participant_key(record),
            feature: record
                .text(columns::FEATURE)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            category: record
                .text(columns::CATEGORY)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            perceived: record.number(columns::STRESS),
            physiological: record.number(columns::RMSSD),
        })
        .collect()
}

/// Grouper producing category-and-dimension keyed correlation series
pub struct CorrelationGrouper;

impl CorrelationGrouper {
    /// Group one participant's correlation rows.
    ///
    /// An absent coefficient excludes that (feature, dimension) pair
    /// entirely; groups and entries keep first-seen order.
    pub fn group(rows: &[CorrelationRow], participant: &str) -> GroupedCorrelations {
        let key = filter::normalize_key(participant);
        let mut out = GroupedCorrelations::default();

        for row in rows {
            if !key.is_empty() && row.participant_id != key {
                continue;
            }
            let category = Category::classify(&row.feature, &row.category);
            let group = group_name(&row.feature, &row.category);
            let feature = if row.feature.is_empty() {
                "(unknown)".to_string()
            } else {
                row.feature.clone()
            };

            for (dimension, coefficient) in [
                (StressDimension::Perceived, row.perceived),
                (StressDimension::Physiological, row.physiological),
            ] {
                if let Some(value) = coefficient {
                    let datum = CorrelationDatum {
                        feature: feature.clone(),
                        magnitude: value.abs() * 100.0,
                        signed_raw: value,
                    };
                    push_datum(out.series_mut(category).groups_mut(dimension), &group, datum);
                }
            }
        }

        out
    }
}

/// Intra-category group name: the normalized category label, with the
/// pre-shift prefix override and an `uncategorized` fallback
fn group_name(feature: &str, category_label: &str) -> String {
    if feature.trim().starts_with(PRE_SHIFT_FEATURE_PREFIX) {
        return "daily_context".to_string();
    }
    let normalized = category_label.trim().to_lowercase();
    if normalized.is_empty() {
        "uncategorized".to_string()
    } else {
        normalized
    }
}

fn push_datum(groups: &mut Vec<CorrelationGroup>, name: &str, datum: CorrelationDatum) {
    match groups.iter_mut().find(|group| group.name == name) {
        Some(group) => group.data.push(datum),
        None => groups.push(CorrelationGroup {
            name: name.to_string(),
            data: vec![datum],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(
        feature: &str,
        category: &str,
        perceived: Option<f64>,
        physiological: Option<f64>,
    ) -> CorrelationRow {
        CorrelationRow {
            participant_id: "p01".to_string(),
            feature: feature.to_string(),
            category: category.to_string(),
            perceived,
            physiological,
        }
    }

    #[test]
    fn test_magnitude_scaling_keeps_signed_raw() {
        let rows = vec![make_row("co2_mean", "env", Some(-0.42), None)];
        let grouped = CorrelationGrouper::group(&rows, "p01");

        let groups = &grouped.environment.perceived;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "env");
        assert_eq!(groups[0].data[0].magnitude, 42.0);
        assert_eq!(groups[0].data[0].signed_raw, -0.42);
        assert!(grouped.environment.physiological.is_empty());
    }

    #[test]
    fn test_prefix_override_reclassifies_to_pre_shift() {
        let rows = vec![make_row("daily_stress", "Context", Some(0.3), None)];
        let grouped = CorrelationGrouper::group(&rows, "p01");

        assert!(grouped.work_context.perceived.is_empty());
        let groups = &grouped.pre_shift.perceived;
        assert_eq!(groups[0].name, "daily_context");
        assert_eq!(groups[0].data[0].feature, "daily_stress");
    }

    #[test]
    fn test_absent_coefficient_excludes_the_pair() {
        let rows = vec![make_row("workload", "context", None, Some(0.2))];
        let grouped = CorrelationGrouper::group(&rows, "p01");
        assert!(grouped.work_context.perceived.is_empty());
        assert_eq!(grouped.work_context.physiological[0].data.len(), 1);
    }

    #[test]
    fn test_unknown_category_goes_to_other_with_label_as_group() {
        let rows = vec![
            make_row("mystery", "Weather", Some(0.1), None),
            make_row("", "", Some(0.2), None),
        ];
        let grouped = CorrelationGrouper::group(&rows, "p01");
        let groups = &grouped.other.perceived;
        assert_eq!(groups[0].name, "weather");
        assert_eq!(groups[1].name, "uncategorized");
        assert_eq!(groups[1].data[0].feature, "(unknown)");
    }

    #[test]
    fn test_first_seen_order_within_groups() {
        let rows = vec![
            make_row("stressor_noise", "stressor", Some(0.1), None),
            make_row("stressor_time_pressure", "stressor", Some(0.5), None),
        ];
        let grouped = CorrelationGrouper::group(&rows, "p01");
        let data = &grouped.stressor.perceived[0].data;
        assert_eq!(data[0].feature, "stressor_noise");
        assert_eq!(data[1].feature, "stressor_time_pressure");
    }

    #[test]
    fn test_participant_filter() {
        let mut row = make_row("workload", "context", Some(0.4), None);
        row.participant_id = "p02".to_string();
        let grouped = CorrelationGrouper::group(&[row], "p01");
        assert!(grouped.work_context.perceived.is_empty());
    }

    #[test]
    fn test_parse_correlation_records() {
        let mut record = RawRecord::new();
        record.set("pid", "p01");
        record.set("feature", " co2_mean ");
        record.set("category", "env");
        record.set("stress", -0.3);
        record.set("rmssd", "");

        let rows = parse_correlation_records(&[record]);
        assert_eq!(rows[0].feature, "co2_mean");
        assert_eq!(rows[0].perceived, Some(-0.3));
        assert_eq!(rows[0].physiological, None);
    }
}
