//! Pipeline orchestration
//!
//! Pure free functions take `(records, participant, config)` and return
//! derived views; `StressPipeline` is the stateful facade that caches the
//! latest committed load per feed and answers the dashboard's queries from
//! that cache. Every derived view is a full recomputation over the cached
//! rows, never an incremental merge.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::correlation::{parse_correlation_records, CorrelationGrouper, CorrelationRow};
use crate::daily::{aggregate_diffs, DailyAggregator, DailyDiffRecord};
use crate::effects::{parse_difference_records, DifferenceRow, InterventionEffectAggregator};
use crate::error::PipelineError;
use crate::ingest::{Feed, LoadGuard, LoadTicket, RowSource};
use crate::normalizer::RowNormalizer;
use crate::report::{correlation_report, intervention_report, CorrelationReport, InterventionReport};
use crate::schema::RawRecord;
use crate::timeline::{BucketOptions, TimelineBucketer};
use crate::types::{
    DailyStressRecord, GroupedCorrelations, Intervention, InterventionEffect,
    NormalizedFeatureRow, StressDimension, TimelineBucket,
};

/// One participant's normalized feature rows and daily reductions, keyed by
/// participant-local date
#[derive(Debug, Clone, Default)]
pub struct FeatureFrame {
    rows_by_date: BTreeMap<String, Vec<NormalizedFeatureRow>>,
    daily: BTreeMap<String, DailyStressRecord>,
}

impl FeatureFrame {
    /// Dates with at least one normalized row, ascending
    pub fn date_keys(&self) -> Vec<String> {
        self.rows_by_date.keys().cloned().collect()
    }

    pub fn rows_for_date(&self, date_key: &str) -> &[NormalizedFeatureRow] {
        self.rows_by_date
            .get(date_key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn daily_record(&self, date_key: &str) -> Option<&DailyStressRecord> {
        self.daily.get(date_key)
    }

    pub fn daily_records(&self) -> Vec<DailyStressRecord> {
        self.daily.values().cloned().collect()
    }

    /// Interventions taken on the date, in row order
    pub fn interventions_for_date(&self, date_key: &str) -> Vec<Intervention> {
        self.rows_for_date(date_key)
            .iter()
            .filter_map(|row| {
                row.intervention_name
                    .clone()
                    .zip(row.intervention_time_ms)
                    .map(|(name, time_ms)| Intervention { name, time_ms })
            })
            .collect()
    }

    /// Call-log timestamps carried by the date's rows, in row order
    pub fn call_times_for_date(&self, date_key: &str) -> Vec<i64> {
        self.rows_for_date(date_key)
            .iter()
            .filter_map(|row| row.call_time_ms)
            .collect()
    }
}

/// Normalize feature-feed records and reduce them to a frame
pub fn build_feature_frame(
    records: &[RawRecord],
    participant: &str,
    config: &PipelineConfig,
) -> FeatureFrame {
    let normalizer = RowNormalizer::new(config);
    let rows = normalizer.normalize_all(records, participant);

    let daily = DailyAggregator::aggregate(&rows)
        .into_iter()
        .map(|record| (record.date_key.clone(), record))
        .collect();

    let mut rows_by_date: BTreeMap<String, Vec<NormalizedFeatureRow>> = BTreeMap::new();
    for row in rows {
        rows_by_date.entry(row.date_key.clone()).or_default().push(row);
    }

    FeatureFrame { rows_by_date, daily }
}

/// Parse and group correlation-feed records for one participant
pub fn grouped_correlations(records: &[RawRecord], participant: &str) -> GroupedCorrelations {
    let rows = parse_correlation_records(records);
    CorrelationGrouper::group(&rows, participant)
}

/// Parse difference-feed records and aggregate per-intervention effects
pub fn intervention_effects(
    records: &[RawRecord],
    participant: &str,
    config: &PipelineConfig,
) -> Vec<InterventionEffect> {
    let rows = parse_difference_records(records, config.offset());
    InterventionEffectAggregator::aggregate(&rows, participant)
}

/// Stateful facade over the three feeds.
///
/// Feeds load independently; a load commits atomically per feed or not at
/// all, and a commit whose ticket was superseded by a newer `begin_load`
/// leaves the cache untouched.
#[derive(Default)]
pub struct StressPipeline {
    config: PipelineConfig,
    guard: LoadGuard,
    frames: HashMap<String, FeatureFrame>,
    correlations: HashMap<String, Vec<CorrelationRow>>,
    differences: HashMap<String, Vec<DifferenceRow>>,
}

impl StressPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Begin a load, invalidating any outstanding ticket for the feed
    pub fn begin_load(&mut self, feed: Feed, origin: &str, participant: &str) -> LoadTicket {
        self.guard.begin(feed, origin, participant)
    }

    /// Commit fetched records under a ticket.
    ///
    /// A stale ticket is rejected without touching the cache.
    pub fn commit(
        &mut self,
        ticket: &LoadTicket,
        records: &[RawRecord],
    ) -> Result<(), PipelineError> {
        if !self.guard.is_current(ticket) {
            return Err(PipelineError::SupersededLoad(
                ticket.feed.as_str().to_string(),
            ));
        }
        let participant = ticket.participant.clone();
        match ticket.feed {
            Feed::Feature => {
                let frame = build_feature_frame(records, &participant, &self.config);
                self.frames.insert(participant, frame);
            }
            Feed::Correlation => {
                self.correlations
                    .insert(participant, parse_correlation_records(records));
            }
            Feed::Difference => {
                self.differences
                    .insert(participant, parse_difference_records(records, self.config.offset()));
            }
        }
        Ok(())
    }

    /// Begin, fetch from a source, and commit in one step
    pub fn load(
        &mut self,
        source: &dyn RowSource,
        feed: Feed,
        origin: &str,
        participant: &str,
    ) -> Result<(), PipelineError> {
        let ticket = self.begin_load(feed, origin, participant);
        let records = source.rows(origin)?;
        self.commit(&ticket, &records)
    }

    fn frame(&self, participant: &str) -> Option<&FeatureFrame> {
        self.frames.get(participant)
    }

    pub fn date_keys(&self, participant: &str) -> Vec<String> {
        self.frame(participant)
            .map(FeatureFrame::date_keys)
            .unwrap_or_default()
    }

    pub fn daily_records(&self, participant: &str) -> Vec<DailyStressRecord> {
        self.frame(participant)
            .map(FeatureFrame::daily_records)
            .unwrap_or_default()
    }

    pub fn daily_record(&self, participant: &str, date_key: &str) -> Option<DailyStressRecord> {
        self.frame(participant)
            .and_then(|frame| frame.daily_record(date_key))
            .cloned()
    }

    pub fn rows_for_date(&self, participant: &str, date_key: &str) -> Vec<NormalizedFeatureRow> {
        self.frame(participant)
            .map(|frame| frame.rows_for_date(date_key).to_vec())
            .unwrap_or_default()
    }

    pub fn interventions_for_date(&self, participant: &str, date_key: &str) -> Vec<Intervention> {
        self.frame(participant)
            .map(|frame| frame.interventions_for_date(date_key))
            .unwrap_or_default()
    }

    pub fn call_times_for_date(&self, participant: &str, date_key: &str) -> Vec<i64> {
        self.frame(participant)
            .map(|frame| frame.call_times_for_date(date_key))
            .unwrap_or_default()
    }

    /// Build the date's timeline buckets from the cached frame
    pub fn build_buckets(
        &self,
        participant: &str,
        date_key: &str,
    ) -> Result<Vec<TimelineBucket>, PipelineError> {
        let day = NaiveDate::parse_from_str(date_key, "%Y-%m-%d")
            .map_err(|_| PipelineError::DateParseError(date_key.to_string()))?;
        let rows = self
            .frame(participant)
            .map(|frame| frame.rows_for_date(date_key))
            .unwrap_or(&[]);
        let options = BucketOptions::from_config(&self.config);
        Ok(TimelineBucketer::build(rows, day, self.config.offset(), &options))
    }

    pub fn grouped_correlations(&self, participant: &str) -> GroupedCorrelations {
        let rows = self.correlations.get(participant).cloned().unwrap_or_default();
        CorrelationGrouper::group(&rows, participant)
    }

    pub fn intervention_effects(&self, participant: &str) -> Vec<InterventionEffect> {
        let rows = self.differences.get(participant).cloned().unwrap_or_default();
        InterventionEffectAggregator::aggregate(&rows, participant)
    }

    pub fn intervention_report(
        &self,
        participant: &str,
        dimension: StressDimension,
    ) -> InterventionReport {
        let effects = self.intervention_effects(participant);
        intervention_report(&effects, dimension, self.config.closeness_threshold)
    }

    pub fn correlation_report(
        &self,
        participant: &str,
        dimension: StressDimension,
    ) -> CorrelationReport {
        let grouped = self.grouped_correlations(participant);
        correlation_report(&grouped, dimension, self.config.closeness_threshold)
    }

    /// Per-day mean diffs from the difference feed (diff calendar view)
    pub fn daily_diff_records(&self, participant: &str) -> Vec<DailyDiffRecord> {
        let rows = self.differences.get(participant).cloned().unwrap_or_default();
        aggregate_diffs(&rows, self.config.offset())
    }
}
