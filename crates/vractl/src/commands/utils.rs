//! Shared utilities for command implementations

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use tabled::Tabled;
use tabled::settings::Style;
use vractl_core::{PollSettings, RequestHandle, wait_for_request};

use crate::cli::OutputFormat;
use crate::error::Result as CliResult;

/// Row structure for vertical table display (used by show commands)
#[derive(Tabled)]
pub struct DetailRow {
    #[tabled(rename = "FIELD")]
    pub field: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl DetailRow {
    pub fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Print detail rows as a two-column table
pub fn print_details(rows: Vec<DetailRow>) {
    println!("{}", tabled::Table::new(rows).with(Style::modern()));
}

/// Where request progress is written
///
/// Structured output keeps stdout clean for the document, so progress goes
/// to stderr instead.
pub fn progress_sink(output_format: OutputFormat) -> Box<dyn Write> {
    if output_format.is_structured() {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    }
}

/// Wait for a request, ending the open progress line on the same sink if the
/// wait is cut short by a timeout or a refresh error
pub async fn wait_with_progress<H, W>(
    handle: &mut H,
    settings: &PollSettings,
    sink: &mut W,
) -> CliResult<()>
where
    H: RequestHandle + ?Sized,
    W: Write + ?Sized,
{
    if let Err(e) = wait_for_request(handle, settings, sink).await {
        writeln!(sink)?;
        sink.flush()?;
        return Err(e.into());
    }
    Ok(())
}

/// Format an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS UTC`
///
/// Anything that does not parse is shown unchanged; absent values show `-`.
pub fn format_date(date: Option<&str>) -> String {
    match date {
        None | Some("") => "-".to_string(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => dt
                .with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            Err(_) => raw.to_string(),
        },
    }
}

/// Prompts the user for confirmation
pub fn confirm_action(message: &str) -> CliResult<bool> {
    print!("Are you sure you want to {}? [y/N]: ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}
