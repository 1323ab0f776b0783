//! Narrative report builders
//!
//! Ranking-backed selections feeding the dashboard's narrative text: the
//! most and least helpful interventions per stress dimension, and the top
//! correlated factors globally and per category.

use serde::{Deserialize, Serialize};

use crate::ranker::{top_n_with_ties, RankedEntry};
use crate::types::{Category, GroupedCorrelations, InterventionEffect, StressDimension};

/// How many interventions the "decreased most with" phrase names
pub const TOP_INTERVENTION_COUNT: usize = 2;

/// How many interventions the "increased with" phrase names
pub const WORST_INTERVENTION_COUNT: usize = 1;

/// How many factors the global "most related" phrase names
pub const GLOBAL_TOP_FACTOR_COUNT: usize = 3;

/// Per-category count of named top factors
pub fn top_factor_count(category: Category) -> usize {
    match category {
        Category::Stressor => 1,
        Category::Environment => 1,
        Category::WorkContext => 2,
        Category::PreShift => 2,
        Category::Other => 1,
    }
}

/// Tie-aware top/bottom intervention selection for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionReport {
    pub dimension: StressDimension,
    /// Interventions stress decreased most with; values keep the original
    /// sign, so the strongest reduction is the most negative diff
    pub most_helpful: Vec<RankedEntry<String>>,
    /// Interventions associated with a stress increase; a harmful
    /// intervention reports a positive diff. Callers drop non-positive
    /// entries before phrasing the "increased with" sentence.
    pub least_helpful: Vec<RankedEntry<String>>,
}

/// Build the intervention report for one dimension.
///
/// Diffs are signed with negative denoting reduction, so the "most helpful"
/// side negates values, ranks descending, then negates back; the "least
/// helpful" side ranks the raw diffs descending.
pub fn intervention_report(
    effects: &[InterventionEffect],
    dimension: StressDimension,
    threshold: f64,
) -> InterventionReport {
    let pairs: Vec<(String, f64)> = effects
        .iter()
        .map(|effect| {
            let value = match dimension {
                StressDimension::Perceived => effect.perceived_diff,
                StressDimension::Physiological => effect.physiological_diff,
            };
            (effect.name.clone(), value)
        })
        .collect();

    let negated: Vec<(String, f64)> = pairs
        .iter()
        .map(|(name, v)| (name.clone(), -v))
        .collect();
    let most_helpful = top_n_with_ties(&negated, TOP_INTERVENTION_COUNT, threshold, |p| p.1)
        .into_iter()
        .map(|entry| RankedEntry {
            item: entry.item.0,
            value: -entry.value,
        })
        .collect();

    let least_helpful = top_n_with_ties(&pairs, WORST_INTERVENTION_COUNT, threshold, |p| p.1)
        .into_iter()
        .map(|entry| RankedEntry {
            item: entry.item.0,
            value: entry.value,
        })
        .collect();

    InterventionReport {
        dimension,
        most_helpful,
        least_helpful,
    }
}

/// One globally top-ranked correlated factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub category: Category,
    pub magnitude: f64,
}

/// The top features of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTop {
    pub category: Category,
    pub features: Vec<String>,
}

/// Tie-aware top-factor selection for one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub dimension: StressDimension,
    /// Global top factors over the flattened first groups of every category
    pub top_factors: Vec<TopFactor>,
    /// Per-category tops, in category catalog order
    pub category_tops: Vec<CategoryTop>,
}

/// Build the correlation report for one dimension
pub fn correlation_report(
    grouped: &GroupedCorrelations,
    dimension: StressDimension,
    threshold: f64,
) -> CorrelationReport {
    let mut flat: Vec<TopFactor> = Vec::new();
    for category in Category::ALL {
        if let Some(first) = grouped.series(category).groups(dimension).first() {
            for datum in &first.data {
                flat.push(TopFactor {
                    feature: datum.feature.clone(),
                    category,
                    magnitude: datum.magnitude,
                });
            }
        }
    }
    let top_factors = top_n_with_ties(&flat, GLOBAL_TOP_FACTOR_COUNT, threshold, |f| f.magnitude)
        .into_iter()
        .map(|entry| entry.item)
        .collect();

    let category_tops = Category::ALL
        .iter()
        .map(|&category| {
            let features = grouped
                .series(category)
                .groups(dimension)
                .first()
                .map(|group| {
                    top_n_with_ties(&group.data, top_factor_count(category), threshold, |d| {
                        d.magnitude
                    })
                    .into_iter()
                    .map(|entry| entry.item.feature)
                    .collect()
                })
                .unwrap_or_default();
            CategoryTop { category, features }
        })
        .collect();

    CorrelationReport {
        dimension,
        top_factors,
        category_tops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::{CorrelationGrouper, CorrelationRow};
    use crate::config::DEFAULT_CLOSENESS_THRESHOLD;

    fn make_effect(name: &str, perceived: f64, physiological: f64) -> InterventionEffect {
        InterventionEffect {
            name: name.to_string(),
            perceived_diff: perceived,
            physiological_diff: physiological,
            sample_count: 1,
        }
    }

    #[test]
    fn test_intervention_report_top_and_worst() {
        let effects = vec![
            make_effect("breathe", -0.4, -0.2),
            make_effect("stretch", -0.3, -0.1),
            make_effect("doomscroll", 0.2, 0.1),
        ];
        let report = intervention_report(
            &effects,
            StressDimension::Perceived,
            DEFAULT_CLOSENESS_THRESHOLD,
        );

        // strongest reductions first, original sign kept
        assert_eq!(report.most_helpful[0].item, "breathe");
        assert!((report.most_helpful[0].value - (-0.4)).abs() < 1e-12);
        assert_eq!(report.most_helpful[1].item, "stretch");

        // the stress increase leads the worst list with its positive diff
        assert_eq!(report.least_helpful[0].item, "doomscroll");
        assert!((report.least_helpful[0].value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_all_helpful_interventions_leave_no_positive_worst_entry() {
        let effects = vec![
            make_effect("breathe", -0.4, 0.0),
            make_effect("stretch", -0.1, 0.0),
        ];
        let report = intervention_report(
            &effects,
            StressDimension::Perceived,
            DEFAULT_CLOSENESS_THRESHOLD,
        );
        assert_eq!(report.most_helpful[0].item, "breathe");
        // nothing increased stress; callers see only negative values here
        assert!(report.least_helpful.iter().all(|e| e.value < 0.0));
    }

    #[test]
    fn test_correlation_report_counts_and_global_top() {
        let rows = vec![
            corr("stressor_noise", "stressor", 0.9),
            corr("stressor_time_pressure", "stressor", 0.2),
            corr("co2_mean", "env", 0.8),
            corr("workload", "context", 0.7),
            corr("valence", "context", 0.65),
            corr("daily_general_sleep", "daily_context", 0.6),
            corr("daily_arousal", "daily_context", 0.1),
        ];
        let grouped = CorrelationGrouper::group(&rows, "p01");
        let report = correlation_report(
            &grouped,
            StressDimension::Perceived,
            DEFAULT_CLOSENESS_THRESHOLD,
        );

        let top: Vec<&str> = report.top_factors.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(top[..3], ["stressor_noise", "co2_mean", "workload"]);

        let stressor_top = &report.category_tops[0];
        assert_eq!(stressor_top.category, Category::Stressor);
        assert_eq!(stressor_top.features, vec!["stressor_noise"]);

        let context_top = report
            .category_tops
            .iter()
            .find(|t| t.category == Category::WorkContext)
            .unwrap();
        assert_eq!(context_top.features, vec!["workload", "valence"]);

        let pre_shift_top = report
            .category_tops
            .iter()
            .find(|t| t.category == Category::PreShift)
            .unwrap();
        assert_eq!(
            pre_shift_top.features,
            vec!["daily_general_sleep", "daily_arousal"]
        );
    }

    #[test]
    fn test_empty_grouping_yields_empty_report() {
        let grouped = GroupedCorrelations::default();
        let report = correlation_report(
            &grouped,
            StressDimension::Physiological,
            DEFAULT_CLOSENESS_THRESHOLD,
        );
        assert!(report.top_factors.is_empty());
        assert!(report.category_tops.iter().all(|t| t.features.is_empty()));
    }

    fn corr(feature: &str, category: &str, value: f64) -> CorrelationRow {
        CorrelationRow {
            participant_id: "p01".to_string(),
            feature: feature.to_string(),
            category: category.to_string(),
            perceived: Some(value),
            physiological: Some(value / 2.0),
        }
    }
}
