use chrono::{NaiveDate, NaiveTime};
use clap::Parser;

use crate::clock::SessionSchedule;
use crate::csv_output::OutputTarget;
use crate::error::GeneratorError;
use crate::names::NAME_SPACE;
use crate::sampler::DEFAULT_QUEUE_CAPACITY;

#[derive(Parser, Debug, Clone)]
#[command(name = "taq-synth")]
#[command(about = "Synthetic trade-and-quote (TAQ) market data generator")]
#[command(version = "1.0.0")]
pub struct GenerateArgs {
    /// Number of synthetic tickers in the universe
    #[arg(short, long, default_value = "10")]
    pub num_stocks: usize,

    /// Randomization seed; the same seed reproduces the same stream
    #[arg(short, long, default_value = "1")]
    pub seed: u64,

    /// Upper bound (exclusive) of the random gap between ticks, in milliseconds
    #[arg(short = 'i', long, default_value = "25")]
    pub max_interval_ms: u32,

    /// First trading date, YYYYMMDD
    #[arg(long, default_value = "20150101")]
    pub date_begin: String,

    /// Last trading date (inclusive), YYYYMMDD
    #[arg(long, default_value = "20150103")]
    pub date_end: String,

    /// Session start time, HHMM
    #[arg(long, default_value = "0930")]
    pub start_time: String,

    /// Session end time, HHMM
    #[arg(long, default_value = "1600")]
    pub end_time: String,

    /// Output CSV path; a YYYYMMDD token writes one file per day (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Capacity of the queue between the stock sampler and the generator
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Progress report interval in seconds (0 = off)
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Verbose logging (default: false)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

/// Validated generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub num_stocks: usize,
    pub seed: u64,
    pub max_interval_ms: u32,
    pub schedule: SessionSchedule,
    pub output: OutputTarget,
    pub queue_capacity: usize,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, GeneratorError> {
    if value.len() != 8 {
        return Err(GeneratorError::Config(format!("date {value:?} is not YYYYMMDD")));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| GeneratorError::Config(format!("date {value:?} is not YYYYMMDD: {e}")))
}

pub fn parse_session_time(value: &str) -> Result<NaiveTime, GeneratorError> {
    if value.len() != 4 {
        return Err(GeneratorError::Config(format!("time {value:?} is not HHMM")));
    }
    NaiveTime::parse_from_str(value, "%H%M")
        .map_err(|e| GeneratorError::Config(format!("time {value:?} is not HHMM: {e}")))
}

impl GenerateArgs {
    pub fn into_config(self) -> Result<GeneratorConfig, GeneratorError> {
        if self.num_stocks == 0 {
            return Err(GeneratorError::Config("number of stocks must be at least 1".to_string()));
        }
        if self.num_stocks > NAME_SPACE {
            return Err(GeneratorError::NameSpaceExhausted {
                requested: self.num_stocks,
                capacity: NAME_SPACE,
            });
        }
        if self.max_interval_ms == 0 {
            return Err(GeneratorError::Config("max interval must be at least 1 ms".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(GeneratorError::Config("queue capacity must be at least 1".to_string()));
        }

        let schedule = SessionSchedule::new(
            parse_date(&self.date_begin)?,
            parse_date(&self.date_end)?,
            parse_session_time(&self.start_time)?,
            parse_session_time(&self.end_time)?,
        )?;

        Ok(GeneratorConfig {
            num_stocks: self.num_stocks,
            seed: self.seed,
            max_interval_ms: self.max_interval_ms,
            schedule,
            output: OutputTarget::from_path(self.output.as_deref()),
            queue_capacity: self.queue_capacity,
        })
    }
}
