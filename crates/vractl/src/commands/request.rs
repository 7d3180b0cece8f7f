//! Catalog request command implementations

use std::io::Write;

use tracing::{debug, info};
use vractl_core::{CatalogRequest, PollSettings, RequestDetails, params};

use crate::cli::{OutputFormat, RequestCommands};
use crate::commands::utils::{
    DetailRow, format_date, print_details, progress_sink, wait_with_progress,
};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

/// Handle request commands
pub async fn handle_request_command(
    request_cmd: &RequestCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match request_cmd {
        RequestCommands::Show { request_id } => {
            handle_show(conn_mgr, profile_name, request_id, output_format, query).await
        }
        RequestCommands::Wait {
            request_id,
            wait_timeout,
            refresh_rate,
        } => {
            let settings = PollSettings::from_secs(*wait_timeout, *refresh_rate);
            handle_wait(
                conn_mgr,
                profile_name,
                request_id,
                &settings,
                output_format,
                query,
            )
            .await
        }
    }
}

async fn handle_show(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    request_id: &str,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile_name)?;
    let details = client.get_request(request_id).await?;

    if output_format.is_structured() || query.is_some() {
        output::print_output(&details, output_format.into(), query)?;
    } else {
        print_details(detail_rows(&details));
    }
    Ok(())
}

async fn handle_wait(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    request_id: &str,
    settings: &PollSettings,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    params::check(settings.validate())?;

    let client = conn_mgr.create_client(profile_name)?;
    let mut request = CatalogRequest::new(client, request_id);

    let mut sink = progress_sink(output_format);
    wait_with_progress(&mut request, settings, sink.as_mut()).await?;
    info!("Request {} finished", request_id);
    debug!("Final request state: {:?}", request.details());

    if let Some(details) = request.details() {
        if output_format.is_structured() || query.is_some() {
            output::print_output(details, output_format.into(), query)?;
        } else {
            writeln!(
                sink,
                "Request {} finished with status {}.",
                request_id,
                details.phase.as_deref().unwrap_or("unknown")
            )?;
        }
    }

    request.ensure_succeeded()?;
    Ok(())
}

fn detail_rows(details: &RequestDetails) -> Vec<DetailRow> {
    vec![
        DetailRow::new("ID", details.id.as_str()),
        DetailRow::new(
            "Request Number",
            details
                .request_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        DetailRow::new("Phase", details.phase.as_deref().unwrap_or("-")),
        DetailRow::new("State", details.state.as_deref().unwrap_or("-")),
        DetailRow::new(
            "Requested For",
            details.requested_for.as_deref().unwrap_or("-"),
        ),
        DetailRow::new(
            "Submitted",
            format_date(details.date_submitted.as_deref()),
        ),
        DetailRow::new(
            "Completed",
            format_date(details.date_completed.as_deref()),
        ),
        DetailRow::new(
            "Completion Details",
            details.completion_details().unwrap_or("-"),
        ),
    ]
}
