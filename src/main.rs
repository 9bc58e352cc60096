//! LHU Calendar - view a student's class schedule in the terminal
//!
//! Fetches the schedule for the requested window, reusing a recent cached
//! copy when there is one, and prints it as a table with one column per day.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use crossterm::style::Stylize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use lhu_calendar::cli::{AppConfig, Cli};
use lhu_calendar::ui::{self, ScheduleTable};
use lhu_calendar::{LhuClient, ScheduleRetriever};

/// Sets up logging to stderr so it never mixes with the table on stdout.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or this
/// crate's debug output with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "lhu_calendar=debug,warn" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };
    init_tracing(config.verbose);

    let client = LhuClient::new(&config.api_url, &config.student_id);
    let retriever = ScheduleRetriever::new(client, config.cache_manager());
    let query = config.query();

    match retriever.get_schedule(query).await {
        Ok(entries) if entries.is_empty() => {
            let message = ui::empty_schedule_message(query.day_range());
            if io::stdout().is_terminal() {
                println!("{}", message.italic());
            } else {
                println!("{}", message);
            }
        }
        Ok(entries) => {
            let table = ScheduleTable::new(&entries, Local::now().date_naive());
            ui::print_schedule(&table)?;
        }
        Err(e) => {
            debug!(error = %e, "could not retrieve schedule");
            let message = ui::fetch_error_message(&e);
            if io::stderr().is_terminal() {
                eprintln!("{}", message.red());
            } else {
                eprintln!("{}", message);
            }
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}
