//! Stresslens - Data transformation core for stress dashboards
//!
//! Stresslens turns a call-center worker's survey and wearable-sensor feeds
//! into per-participant stress views through a deterministic pipeline:
//! ingestion → participant filtering → row normalization → aggregation.
//!
//! ## Views
//!
//! - **Daily**: one stress record per participant-local calendar date
//! - **Timeline**: fixed-count intraday buckets with slot summaries
//! - **Correlations**: category-grouped, magnitude-scaled factor series
//! - **Interventions**: mean pre/post effects and tie-aware rankings

pub mod config;
pub mod correlation;
pub mod daily;
pub mod effects;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod normalizer;
pub mod pipeline;
pub mod ranker;
pub mod report;
pub mod schema;
pub mod stats;
pub mod timeline;
pub mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use ingest::{records_from_json, Feed, JsonSource, MemorySource, RowSource};
pub use pipeline::{
    build_feature_frame, grouped_correlations, intervention_effects, FeatureFrame, StressPipeline,
};

// Schema exports
pub use schema::{RawRecord, StressorFlag};

// View-type exports
pub use types::{
    Category, DailyStressRecord, GroupedCorrelations, InterventionEffect, NormalizedFeatureRow,
    StressDimension, TimelineBucket,
};

/// Stresslens version embedded in exported payloads
pub const LENS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported payloads
pub const PRODUCER_NAME: &str = "stresslens";
