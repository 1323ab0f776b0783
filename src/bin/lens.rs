//! Lens CLI - Command-line interface for Stresslens
//!
//! Commands:
//! - daily: Reduce a feature feed to daily stress records
//! - buckets: Build one day's timeline buckets
//! - correlations: Group a correlation feed by category
//! - effects: Aggregate intervention effects from a difference feed
//! - report: Build the narrative intervention and correlation reports

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stresslens::pipeline::{build_feature_frame, grouped_correlations, intervention_effects};
use stresslens::report::{correlation_report, intervention_report};
use stresslens::{records_from_json, PipelineConfig, PipelineError, StressDimension, LENS_VERSION};

/// Stresslens - Data transformation core for stress dashboards
#[derive(Parser)]
#[command(name = "lens")]
#[command(version = LENS_VERSION)]
#[command(about = "Transform survey and sensor feeds into stress views", long_about = None)]
struct Cli {
    /// Observer UTC offset in minutes (e.g. 540 for UTC+9)
    #[arg(long, default_value = "0", global = true)]
    offset_minutes: i32,

    /// Participant identifier to keep (empty keeps every row)
    #[arg(short, long, default_value = "", global = true)]
    participant: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a feature feed to daily stress records
    Daily {
        /// Feature-feed JSON row array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Build one day's timeline buckets
    Buckets {
        /// Feature-feed JSON row array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Participant-local date, YYYY-MM-DD
        #[arg(short, long)]
        date: String,

        /// Number of slots per day
        #[arg(long, default_value = "30")]
        slots: usize,
    },

    /// Group a correlation feed by category
    Correlations {
        /// Correlation-feed JSON row array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Aggregate intervention effects from a difference feed
    Effects {
        /// Difference-feed JSON row array (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Build the narrative reports for one stress dimension
    Report {
        /// Correlation-feed JSON row array
        #[arg(long)]
        correlations: Option<PathBuf>,

        /// Difference-feed JSON row array
        #[arg(long)]
        differences: Option<PathBuf>,

        /// Stress dimension to report on
        #[arg(long, value_enum, default_value = "perceived")]
        dimension: Dimension,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Dimension {
    /// Self-reported survey stress
    Perceived,
    /// RMSSD-derived stress proxy
    Physiological,
}

impl From<Dimension> for StressDimension {
    fn from(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Perceived => StressDimension::Perceived,
            Dimension::Physiological => StressDimension::Physiological,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lens: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LensCliError> {
    let config = PipelineConfig::with_offset_minutes(cli.offset_minutes);
    let participant = cli.participant;

    match cli.command {
        Commands::Daily { input } => {
            let records = read_records(&input)?;
            let frame = build_feature_frame(&records, &participant, &config);
            emit(&frame.daily_records())
        }

        Commands::Buckets { input, date, slots } => {
            let records = read_records(&input)?;
            let mut config = config;
            config.slot_count = slots.max(1);
            let frame = build_feature_frame(&records, &participant, &config);

            let day = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| PipelineError::DateParseError(date.clone()))?;
            let options = stresslens::timeline::BucketOptions::from_config(&config);
            let buckets = stresslens::timeline::TimelineBucketer::build(
                frame.rows_for_date(&date),
                day,
                config.offset(),
                &options,
            );
            emit(&buckets)
        }

        Commands::Correlations { input } => {
            let records = read_records(&input)?;
            emit(&grouped_correlations(&records, &participant))
        }

        Commands::Effects { input } => {
            let records = read_records(&input)?;
            emit(&intervention_effects(&records, &participant, &config))
        }

        Commands::Report {
            correlations,
            differences,
            dimension,
        } => {
            let dimension = StressDimension::from(dimension);
            let threshold = config.closeness_threshold;

            let mut out = serde_json::Map::new();
            if let Some(path) = correlations {
                let records = read_records(&path)?;
                let grouped = grouped_correlations(&records, &participant);
                let report = correlation_report(&grouped, dimension, threshold);
                out.insert("correlations".to_string(), serde_json::to_value(&report)?);
            }
            if let Some(path) = differences {
                let records = read_records(&path)?;
                let effects = intervention_effects(&records, &participant, &config);
                let report = intervention_report(&effects, dimension, threshold);
                out.insert("interventions".to_string(), serde_json::to_value(&report)?);
            }
            if out.is_empty() {
                return Err(LensCliError::NoInput);
            }
            emit(&serde_json::Value::Object(out))
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<stresslens::RawRecord>, LensCliError> {
    let data = if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };
    Ok(records_from_json(&data)?)
}

/// Pretty-print on a terminal, compact when piped
fn emit<T: serde::Serialize>(value: &T) -> Result<(), LensCliError> {
    let output = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

enum LensCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    NoInput,
}

impl From<io::Error> for LensCliError {
    fn from(e: io::Error) -> Self {
        LensCliError::Io(e)
    }
}

impl From<PipelineError> for LensCliError {
    fn from(e: PipelineError) -> Self {
        LensCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for LensCliError {
    fn from(e: serde_json::Error) -> Self {
        LensCliError::Json(e)
    }
}

impl std::fmt::Display for LensCliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LensCliError::Io(e) => write!(f, "io error: {}", e),
            LensCliError::Pipeline(e) => write!(f, "{}", e),
            LensCliError::Json(e) => write!(f, "json error: {}", e),
            LensCliError::NoInput => write!(f, "report needs --correlations and/or --differences"),
        }
    }
}
