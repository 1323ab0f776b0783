//! Pipeline configuration
//!
//! Constructor-injected settings shared by the transformation stages: the
//! observer's fixed UTC offset (date keys are participant-local), the
//! canonical work window used when a day has no rows, the timeline slot
//! count, and the ranker's closeness threshold.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Default number of timeline slots per day
pub const DEFAULT_SLOT_COUNT: usize = 30;

/// Default closeness threshold for tie-aware top-N selection
pub const DEFAULT_CLOSENESS_THRESHOLD: f64 = 0.85;

/// Canonical work window, used as the timeline span for days without rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    /// Window start hour (local, 0-23)
    pub start_hour: u32,
    /// Window end hour (local, 0-23)
    pub end_hour: u32,
}

impl Default for WorkWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
        }
    }
}

/// Settings for one pipeline instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Observer's fixed UTC offset in minutes (0 = UTC)
    pub utc_offset_minutes: i32,
    /// Fallback work window for empty days
    pub work_window: WorkWindow,
    /// Number of timeline slots per day
    pub slot_count: usize,
    /// Closeness threshold for the tie-aware ranker
    pub closeness_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            work_window: WorkWindow::default(),
            slot_count: DEFAULT_SLOT_COUNT,
            closeness_threshold: DEFAULT_CLOSENESS_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Create a config for a deployment at the given fixed UTC offset
    pub fn with_offset_minutes(utc_offset_minutes: i32) -> Self {
        Self {
            utc_offset_minutes,
            ..Self::default()
        }
    }

    /// The observer's calendar offset; falls back to UTC when out of range
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
