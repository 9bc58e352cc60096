//! Command-line interface parsing for the LHU calendar
//!
//! Arguments fall back to environment variables (`STUDENT_ID`, `API_URL`,
//! `DAY_RANGE`, `CACHE_TTL_HOURS`), and are validated once into an
//! [`AppConfig`] that the rest of the program receives by reference.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;
use thiserror::Error;

use crate::cache::{CacheManager, DEFAULT_TTL_HOURS};
use crate::data::lhu::DEFAULT_API_URL;
use crate::datetime::parse_query_date;
use crate::retrieval::Query;

/// Number of days shown when no range is given
pub const DEFAULT_DAY_RANGE: u32 = 4;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--time` value is not a `YYYY-MM-DD` date
    #[error("Invalid date format: '{0}'. Please use YYYY-MM-DD.")]
    InvalidDate(String),

    /// No student id was given on the command line or in the environment
    #[error("Missing student id: pass --student-id or set STUDENT_ID")]
    MissingStudentId,
}

/// LHU Calendar - view your class schedule
#[derive(Parser, Debug)]
#[command(name = "calen")]
#[command(about = "LHU class schedule viewer")]
#[command(version)]
pub struct Cli {
    /// Query date in YYYY-MM-DD format (default: today)
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    pub time: Option<String>,

    /// Number of days to show, starting at the query date
    #[arg(short, long, value_name = "DAYS", env = "DAY_RANGE", default_value_t = DEFAULT_DAY_RANGE)]
    pub range: u32,

    /// Student identifier to fetch the schedule for
    #[arg(long, env = "STUDENT_ID")]
    pub student_id: Option<String>,

    /// Calendar endpoint
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Hours a cached schedule stays valid
    #[arg(long, env = "CACHE_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS)]
    pub ttl_hours: u32,

    /// Directory for cached responses (default: platform cache directory)
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Log retrieval details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub student_id: String,
    /// Query start; `None` means now
    pub query_time: Option<NaiveDateTime>,
    pub day_range: u32,
    pub ttl_hours: u32,
    pub cache_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl AppConfig {
    /// Creates an AppConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(AppConfig)` with every value resolved
    /// * `Err(CliError)` if the date is malformed or the student id is missing
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let student_id = cli
            .student_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(CliError::MissingStudentId)?
            .to_string();

        let query_time = cli
            .time
            .as_deref()
            .map(|s| parse_query_date(s).map_err(|_| CliError::InvalidDate(s.to_string())))
            .transpose()?;

        Ok(AppConfig {
            api_url: cli.api_url.clone(),
            student_id,
            query_time,
            day_range: cli.range,
            ttl_hours: cli.ttl_hours,
            cache_dir: cli.cache_dir.clone(),
            verbose: cli.verbose,
        })
    }

    /// The schedule query this configuration asks for
    pub fn query(&self) -> Query {
        match self.query_time {
            Some(time) => Query::new(time, self.day_range),
            None => Query::now(self.day_range),
        }
    }

    /// Cache manager for the configured directory, or the platform default
    pub fn cache_manager(&self) -> Option<CacheManager> {
        match self.cache_dir {
            Some(ref dir) => Some(CacheManager::with_dir(dir.clone(), self.ttl_hours)),
            None => CacheManager::new(self.ttl_hours),
        }
    }
}
