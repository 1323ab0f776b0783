//! Shared numeric helpers
//!
//! Every aggregation stage funnels through these: presence-aware means,
//! min/max ranges, min-max normalization, and level quantization. Absence is
//! always `None`, never NaN, so a missing cell can never poison a sum.

use std::collections::HashSet;
use std::hash::Hash;

/// Inclusive min/max range over a set of finite values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Keep a value only when it is finite
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Arithmetic mean; `None` for an empty list
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Arithmetic mean over the present values of an `Option` sequence
pub fn mean_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean(&present)
}

/// Min/max over the finite values; `None` when none are finite
pub fn range(values: &[f64]) -> Option<Range> {
    let mut finite_values = values.iter().copied().filter(|v| v.is_finite());
    let first = finite_values.next()?;
    let mut out = Range { min: first, max: first };
    for v in finite_values {
        if v < out.min {
            out.min = v;
        }
        if v > out.max {
            out.max = v;
        }
    }
    Some(out)
}

/// Min-max normalize into 0..1; a degenerate range (`min == max`) is `None`
pub fn normalize(value: f64, range: &Range) -> Option<f64> {
    if !value.is_finite() || range.max == range.min {
        return None;
    }
    Some((value - range.min) / (range.max - range.min))
}

/// Quantize a unit-domain raw score (0..1) to a discrete level 0..4
pub fn level_from_unit(raw: f64) -> u8 {
    (raw * 4.0).round().clamp(0.0, 4.0) as u8
}

/// Quantize a survey-domain raw score (already 0..4) to a discrete level 0..4
pub fn level_from_survey(raw: f64) -> u8 {
    raw.round().clamp(0.0, 4.0) as u8
}

/// Quantize a signed unit-domain raw score (-1..1) to a level -4..4
pub fn signed_level_from_unit(raw: f64) -> i8 {
    (raw * 4.0).round().clamp(-4.0, 4.0) as i8
}

/// Clamp a survey response into its declared 0..4 domain
pub fn clamp_survey(value: f64) -> f64 {
    value.clamp(0.0, 4.0)
}

/// Deduplicate while keeping first-seen order
pub fn dedup_stable<T: Clone + Eq + Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert((*item).clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_absent() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn test_mean_present_skips_absent() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(mean_present(values), Some(2.0));
        assert_eq!(mean_present(vec![None, None]), None);
    }

    #[test]
    fn test_range_skips_non_finite() {
        let r = range(&[3.0, f64::NAN, 1.0, f64::INFINITY, 2.0]).unwrap();
        assert_eq!(r.min, 1.0);
        assert_eq!(r.max, 3.0);
        assert!(range(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_normalize_degenerate_range_is_absent() {
        let r = Range { min: 5.0, max: 5.0 };
        assert_eq!(normalize(5.0, &r), None);

        let r = Range { min: 0.0, max: 10.0 };
        assert_eq!(normalize(2.5, &r), Some(0.25));
    }

    #[test]
    fn test_level_quantization_clamps() {
        assert_eq!(level_from_unit(0.0), 0);
        assert_eq!(level_from_unit(0.5), 2);
        assert_eq!(level_from_unit(1.0), 4);
        assert_eq!(level_from_unit(2.5), 4);
        assert_eq!(level_from_unit(-1.0), 0);

        assert_eq!(level_from_survey(3.0), 3);
        assert_eq!(level_from_survey(7.2), 4);
        assert_eq!(level_from_survey(-2.0), 0);
    }

    #[test]
    fn test_signed_level_clamps_both_ends() {
        assert_eq!(signed_level_from_unit(-0.5), -2);
        assert_eq!(signed_level_from_unit(2.0), 4);
        assert_eq!(signed_level_from_unit(-2.0), -4);
    }

    #[test]
    fn test_dedup_stable_keeps_first_seen_order() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(dedup_stable(&items), vec!["b", "a", "c"]);
    }
}
