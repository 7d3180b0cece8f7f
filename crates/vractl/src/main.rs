use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vractl_core::Config;

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::VraCtlError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let result = match load_connection_manager(&cli) {
        Ok(conn_mgr) => execute_command(&cli, &conn_mgr).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        e.print_diagnostic();
        std::process::exit(1);
    }
}

/// Load configuration from the specified path or the default location
fn load_connection_manager(cli: &Cli) -> Result<ConnectionManager, VraCtlError> {
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    Ok(ConnectionManager::with_config_path(config, config_path))
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new(log_directives(verbose))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

fn log_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "vractl=warn,vractl_core=warn",
        1 => "vractl=info,vractl_core=info",
        2 => "vractl=debug,vractl_core=debug",
        _ => "vractl=trace,vractl_core=trace",
    }
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), VraCtlError> {
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let profile = cli.profile.as_deref();
    let query = cli.query.as_deref();

    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if cli.output.is_structured() {
                let output_data = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "name": env!("CARGO_PKG_NAME"),
                });
                output::print_output(&output_data, cli.output.into(), query)
                    .map_err(VraCtlError::from)
            } else {
                println!("vractl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Profile(profile_cmd) => {
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }
        Commands::Catalog(catalog_cmd) => {
            commands::catalog::handle_catalog_command(
                catalog_cmd,
                conn_mgr,
                profile,
                cli.output,
                query,
            )
            .await
        }
        Commands::Server(server_cmd) => {
            commands::server::handle_server_command(
                server_cmd, conn_mgr, profile, cli.output, query,
            )
            .await
        }
        Commands::Request(request_cmd) => {
            commands::request::handle_request_command(
                request_cmd,
                conn_mgr,
                profile,
                cli.output,
                query,
            )
            .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    trace!("Executing command: {:?}", CommandSummary(command));
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name, .. } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Catalog(cli::CatalogCommands::List { entitled_only }) => {
            if *entitled_only {
                "catalog list --entitled-only".to_string()
            } else {
                "catalog list".to_string()
            }
        }
        Commands::Server(cli::ServerCommands::Create { catalog_id, .. }) => {
            format!("server create {}", catalog_id)
        }
        Commands::Request(cli::RequestCommands::Show { request_id }) => {
            format!("request show {}", request_id)
        }
        Commands::Request(cli::RequestCommands::Wait { request_id, .. }) => {
            format!("request wait {}", request_id)
        }
    }
}

/// Debug view of a command that never includes a profile password
struct CommandSummary<'a>(&'a Commands);

impl std::fmt::Debug for CommandSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Commands::Profile(cli::ProfileCommands::Set { .. }) => {
                f.write_str("Profile(Set { [credentials redacted] })")
            }
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_log_directives_by_verbosity() {
        assert_eq!(log_directives(0), "vractl=warn,vractl_core=warn");
        assert_eq!(log_directives(2), "vractl=debug,vractl_core=debug");
        assert_eq!(log_directives(7), "vractl=trace,vractl_core=trace");
    }

    #[test]
    fn test_format_command_redacts_credentials() {
        let cli = parse(&[
            "vractl",
            "profile",
            "set",
            "lab",
            "--password",
            "hunter2",
        ]);
        let formatted = format_command(&cli.command);
        assert_eq!(formatted, "profile set lab [credentials redacted]");
        assert!(!format!("{:?}", CommandSummary(&cli.command)).contains("hunter2"));
    }

    #[test]
    fn test_format_command_server_create() {
        let cli = parse(&["vractl", "server", "create", "cat-1", "--cpus", "1"]);
        assert_eq!(format_command(&cli.command), "server create cat-1");
    }
}
