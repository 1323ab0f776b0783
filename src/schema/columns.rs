//! Declared column catalog for the three tabular feeds
//!
//! Every recognized column name and its fallback synonyms is declared once
//! here; the normalizer reads rows only through this catalog and ignores
//! unknown columns.

use serde::{Deserialize, Serialize};

/// Participant identity column and its synonyms
pub const PARTICIPANT: &[&str] = &["pid", "participant_id", "user_id"];

/// Event timestamp column and its synonyms, in preference order
pub const EVENT_TIME: &[&str] = &["windowStartTime", "surveyTime", "callEndTime"];

/// Upstream validity flag; a row with this column present and false is dropped
pub const VALID: &str = "valid";

/// Self-reported stress, 0-4 survey scale
pub const STRESS: &str = "stress";

/// Heart-rate variability (RMSSD, ms)
pub const RMSSD: &str = "rmssd";

// Contextual survey numerics (0-5 scale)
pub const WORKLOAD: &str = "workload";
pub const AROUSAL: &str = "arousal";
pub const VALENCE: &str = "valence";
pub const TIREDNESS: &[&str] = &["tiredness", "daily_tiredness"];
pub const SURFACE_ACTING: &str = "surface_acting";

/// Flag raised when the preceding call was a complaint call
pub const CALL_TYPE_ANGRY: &str = "call_type_angry";

// Environment sensor numerics
pub const HUMIDITY: &str = "humidity_mean";
pub const CO2: &str = "co2_mean";
pub const TVOC: &str = "tvoc_mean";
pub const TEMPERATURE: &str = "temperature_mean";

// Physiological numerics
pub const STEPS: &str = "steps";
pub const SKIN_TEMP: &[&str] = &["skintemp", "skintemp_diff"];
pub const HR_MIN: &str = "hr_min";
pub const HR_MAX: &str = "hr_max";
pub const HR_MEAN: &str = "hr_mean";
pub const ACC_MEAN: &str = "acc_mean";
pub const ACC_STD: &str = "acc_std";

// Pre-shift daily survey numerics
pub const DAILY_AROUSAL: &str = "daily_arousal";
pub const DAILY_VALENCE: &str = "daily_valence";
pub const DAILY_TIREDNESS: &str = "daily_tiredness";
pub const DAILY_GENERAL_HEALTH: &str = "daily_general_health";
pub const DAILY_GENERAL_SLEEP: &str = "daily_general_sleep";

/// Call-log timestamp carried on feature rows
pub const CALLS: &str = "calls";

/// Survey-type discriminator column
pub const SURVEY_TYPE: &str = "survey_type";

/// Discriminator value marking a post-intervention survey row
pub const SURVEY_TYPE_POST_INTERVENTION: &str = "post_intervention";

/// Intervention name column and its synonyms
pub const INTERVENTION_NAME: &[&str] = &["interventionName", "intervention"];

/// Optional intervention timestamp; falls back to the row's event time
pub const INTERVENTION_TIME: &str = "interventionTime";

// Correlation feed columns (signed coefficients live under the stress and
// rmssd column names)
pub const FEATURE: &str = "feature";
pub const CATEGORY: &str = "category";

// Difference feed columns
pub const PERCEIVED_DIFF: &str = "perceived_diff";
pub const PHYSIO_DIFF: &str = "physio_diff";

/// The ten boolean stressor flags a survey row may raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressorFlag {
    LackAbility,
    DifficultWork,
    EvalPressure,
    WorkBad,
    HardCommunication,
    RudeCustomer,
    TimePressure,
    Noise,
    PeerConflict,
    Other,
}

impl StressorFlag {
    pub const ALL: [StressorFlag; 10] = [
        StressorFlag::LackAbility,
        StressorFlag::DifficultWork,
        StressorFlag::EvalPressure,
        StressorFlag::WorkBad,
        StressorFlag::HardCommunication,
        StressorFlag::RudeCustomer,
        StressorFlag::TimePressure,
        StressorFlag::Noise,
        StressorFlag::PeerConflict,
        StressorFlag::Other,
    ];

    /// The feed column carrying this flag
    pub fn column(&self) -> &'static str {
        match self {
            StressorFlag::LackAbility => "stressor_lack_ability",
            StressorFlag::DifficultWork => "stressor_difficult_work",
            StressorFlag::EvalPressure => "stressor_eval_pressure",
            StressorFlag::WorkBad => "stressor_work_bad",
            StressorFlag::HardCommunication => "stressor_hard_communication",
            StressorFlag::RudeCustomer => "stressor_rude_customer",
            StressorFlag::TimePressure => "stressor_time_pressure",
            StressorFlag::Noise => "stressor_noise",
            StressorFlag::PeerConflict => "stressor_peer_conflict",
            StressorFlag::Other => "stressor_other",
        }
    }

    /// Short display label for timeline summaries
    pub fn label(&self) -> &'static str {
        match self {
            StressorFlag::LackAbility => "feeling underqualified",
            StressorFlag::DifficultWork => "unfamiliar work",
            StressorFlag::EvalPressure => "evaluation pressure",
            StressorFlag::WorkBad => "frustrating work process",
            StressorFlag::HardCommunication => "communication breakdown",
            StressorFlag::RudeCustomer => "rude customer",
            StressorFlag::TimePressure => "time pressure",
            StressorFlag::Noise => "ambient noise",
            StressorFlag::PeerConflict => "peer conflict",
            StressorFlag::Other => "other",
        }
    }
}

/// Map a stressor flag column name to its display label
pub fn stressor_label(code: &str) -> Option<&'static str> {
    StressorFlag::ALL
        .iter()
        .find(|flag| flag.column() == code)
        .map(|flag| flag.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_columns_are_distinct() {
        let mut columns: Vec<&str> = StressorFlag::ALL.iter().map(|f| f.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), 10);
    }

    #[test]
    fn test_stressor_label_lookup() {
        assert_eq!(stressor_label("stressor_rude_customer"), Some("rude customer"));
        assert_eq!(stressor_label("not_a_flag"), None);
    }
}
