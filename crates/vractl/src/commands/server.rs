//! Server provisioning command implementations

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};
use vractl_core::{
    ExtraParam, PollSettings, RequestOptions, Resource, params,
};

use crate::cli::{OutputFormat, ServerCommands};
use crate::commands::utils::{DetailRow, print_details, progress_sink, wait_with_progress};
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, VraCtlError};
use crate::output;

/// Handle server commands
pub async fn handle_server_command(
    server_cmd: &ServerCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match server_cmd {
        ServerCommands::Create {
            catalog_id,
            cpus,
            memory,
            requested_for,
            subtenant_id,
            lease_days,
            notes,
            extra_params,
            server_create_timeout,
            request_refresh_rate,
            node_name,
        } => {
            let options = CreateOptions {
                request: RequestOptions {
                    catalog_id: catalog_id.clone(),
                    cpus: *cpus,
                    memory: *memory,
                    requested_for: requested_for.clone(),
                    subtenant_id: subtenant_id.clone(),
                    lease_days: *lease_days,
                    notes: notes.clone(),
                    extra_params: extra_params.clone(),
                },
                settings: PollSettings::from_secs(*server_create_timeout, *request_refresh_rate),
                node_name: node_name.clone(),
            };
            handle_create(conn_mgr, profile_name, options, output_format, query).await
        }
    }
}

struct CreateOptions {
    request: RequestOptions,
    settings: PollSettings,
    node_name: Option<String>,
}

async fn handle_create(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    mut options: CreateOptions,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    params::check(options.settings.validate())?;

    let client = conn_mgr.create_client(profile_name)?;
    if options.request.requested_for.is_none() {
        options.request.requested_for = Some(client.username().to_string());
    }
    debug!(
        "Requesting catalog item {} with extra parameters {:?}",
        options.request.catalog_id,
        extra_param_keys(&options.request.extra_params)
    );

    let mut sink = progress_sink(output_format);
    let mut request = client.provision(&options.request).await?;
    writeln!(sink, "Catalog request {} submitted.", request.id())?;

    wait_with_progress(&mut request, &options.settings, sink.as_mut()).await?;
    writeln!(sink, "Catalog request complete.")?;
    request.ensure_succeeded()?;

    let servers: Vec<Resource> = request
        .resources()
        .await?
        .into_iter()
        .filter(Resource::is_server)
        .collect();
    info!(
        "Request {} created {} server(s)",
        request.id(),
        servers.len()
    );

    let summary = ProvisionSummary::new(request.id(), &servers, options.node_name.as_deref())?;
    if output_format.is_structured() || query.is_some() {
        output::print_output(&summary, output_format.into(), query)?;
    } else {
        writeln!(sink)?;
        print_details(summary.detail_rows());
    }
    Ok(())
}

fn extra_param_keys(params: &[ExtraParam]) -> Vec<&str> {
    params.iter().map(|p| p.key.as_str()).collect()
}

/// Outcome of a successful provisioning request
#[derive(Debug, Serialize)]
struct ProvisionSummary {
    request_id: String,
    node_name: String,
    servers: Vec<ServerInfo>,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    resource_id: String,
    ip_addresses: Vec<String>,
    bootstrap_address: String,
}

impl ProvisionSummary {
    fn new(request_id: &str, servers: &[Resource], node_name: Option<&str>) -> CliResult<Self> {
        let first = servers.first().ok_or_else(|| VraCtlError::ApiError {
            message: format!("Request {} completed but no server was created", request_id),
        })?;

        Ok(Self {
            request_id: request_id.to_string(),
            node_name: node_name.unwrap_or(&first.name).to_string(),
            servers: servers
                .iter()
                .map(|server| ServerInfo {
                    name: server.name.clone(),
                    resource_id: server.resource_id.clone(),
                    ip_addresses: server.ip_addresses(),
                    bootstrap_address: server.bootstrap_address(),
                })
                .collect(),
        })
    }

    fn detail_rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![
            DetailRow::new("Request ID", self.request_id.as_str()),
            DetailRow::new("Node Name", self.node_name.as_str()),
        ];
        for server in &self.servers {
            rows.push(DetailRow::new("Server Name", server.name.as_str()));
            rows.push(DetailRow::new("Server ID", server.resource_id.as_str()));
            let ips = if server.ip_addresses.is_empty() {
                "-".to_string()
            } else {
                server.ip_addresses.join(", ")
            };
            rows.push(DetailRow::new("IP Addresses", ips));
            rows.push(DetailRow::new(
                "Bootstrap Address",
                server.bootstrap_address.as_str(),
            ));
        }
        rows
    }
}
