//! CLI structure and command definitions

use clap::{Parser, Subcommand};
use vractl_core::ExtraParam;

/// Command-line client for a vRA service catalog
#[derive(Parser, Debug)]
#[command(name = "vractl")]
#[command(version, about = "Browse a vRA service catalog and provision servers from it")]
#[command(long_about = "
Browse a vRA service catalog and provision servers from it

EXAMPLES:
    # Set up a profile (password will be prompted)
    vractl profile set lab --base-url https://vra.corp.local \\
        --username admin@corp.local --tenant vsphere.local

    # List the catalog items you are entitled to
    vractl catalog list --entitled-only

    # Provision a server and wait for it
    vractl server create 5dcd1900-3b89-433d-8563-9606ae1249b8 --cpus 2 --memory 4096

    # Filter output with JMESPath
    vractl catalog list -o json -q '[?status==`PUBLISHED`].name'

For more help on a specific command, run:
    vractl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "VRACTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "VRACTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output, tables where the command has them
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// Whether this format is meant for machines rather than people
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json | Self::Yaml)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Service catalog operations
    #[command(subcommand, visible_alias = "cat")]
    Catalog(CatalogCommands),

    /// Server provisioning
    #[command(subcommand, visible_alias = "srv")]
    Server(ServerCommands),

    /// Catalog request tracking
    #[command(subcommand, visible_alias = "req")]
    Request(RequestCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Service catalog commands
#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List catalog items
    #[command(visible_alias = "ls")]
    #[command(after_help = "EXAMPLES:
    # Every catalog item in the tenant
    vractl catalog list

    # Only the items you can request
    vractl catalog list --entitled-only
")]
    List {
        /// Only list catalog items the user is entitled to request
        #[arg(long)]
        entitled_only: bool,
    },
}

/// Server provisioning commands
#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// Request a new server from a catalog item and wait for it
    #[command(after_help = "EXAMPLES:
    # Two CPUs, 4 GB of memory, requested for the profile user
    vractl server create 5dcd1900-3b89-433d-8563-9606ae1249b8 --cpus 2 --memory 4096

    # Pass blueprint-specific values
    vractl server create 5dcd1900-3b89-433d-8563-9606ae1249b8 --cpus 1 --memory 1024 \\
        --extra-param hostname=string:web-01 --extra-param disk_gb=integer:40
")]
    Create {
        /// Catalog item ID to request
        catalog_id: String,

        /// Number of CPUs the server should have
        #[arg(long)]
        cpus: Option<u32>,

        /// Amount of RAM, in MB, the server should have
        #[arg(long)]
        memory: Option<u32>,

        /// Login of the user the request is made on behalf of; defaults to the profile username
        #[arg(long)]
        requested_for: Option<String>,

        /// Subtenant (business group) ID; defaults to the blueprint's subtenant
        #[arg(long)]
        subtenant_id: Option<String>,

        /// Number of days requested for the server lease, if the blueprint allows it
        #[arg(long)]
        lease_days: Option<u32>,

        /// String to use as the description or reason for the request
        #[arg(long)]
        notes: Option<String>,

        /// Additional parameter for the blueprint, as KEY=TYPE:VALUE with TYPE string or integer
        #[arg(long = "extra-param", value_name = "KEY=TYPE:VALUE")]
        extra_params: Vec<ExtraParam>,

        /// Seconds to wait for the request to complete
        #[arg(long, default_value_t = 600)]
        server_create_timeout: u64,

        /// Seconds between request status checks
        #[arg(long, default_value_t = 2)]
        request_refresh_rate: u64,

        /// Node name to report for the new server; defaults to the server name
        #[arg(long)]
        node_name: Option<String>,
    },
}

/// Catalog request commands
#[derive(Subcommand, Debug)]
pub enum RequestCommands {
    /// Show the current state of a request
    #[command(visible_alias = "get")]
    Show {
        /// Request ID
        request_id: String,
    },

    /// Wait for a submitted request to complete
    Wait {
        /// Request ID
        request_id: String,

        /// Seconds to wait for the request to complete
        #[arg(long, default_value_t = 600)]
        wait_timeout: u64,

        /// Seconds between request status checks
        #[arg(long, default_value_t = 2)]
        refresh_rate: u64,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (password will be prompted)
    vractl profile set lab --base-url https://vra.corp.local \\
        --username admin@corp.local --tenant vsphere.local

    # Lab appliance with a self-signed certificate
    vractl profile set lab --base-url https://vra.lab.local \\
        --username admin --password secret --tenant lab --insecure
")]
    Set {
        /// Profile name
        name: String,

        /// Base URL of the vRA appliance
        #[arg(long)]
        base_url: Option<String>,

        /// Username to authenticate with
        #[arg(long)]
        username: Option<String>,

        /// Password to authenticate with; prompted for when omitted
        #[arg(long)]
        password: Option<String>,

        /// Tenant to authenticate against
        #[arg(long)]
        tenant: Option<String>,

        /// Number of items fetched per page when listing
        #[arg(long)]
        page_size: Option<u32>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Store the password in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use when --profile is not given
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_server_create_defaults() {
        let cli = Cli::try_parse_from(["vractl", "server", "create", "cat-1", "--cpus", "2"]).unwrap();
        let Commands::Server(ServerCommands::Create {
            catalog_id,
            cpus,
            memory,
            server_create_timeout,
            request_refresh_rate,
            extra_params,
            ..
        }) = cli.command
        else {
            panic!("expected server create");
        };
        assert_eq!(catalog_id, "cat-1");
        assert_eq!(cpus, Some(2));
        assert_eq!(memory, None);
        assert_eq!(server_create_timeout, 600);
        assert_eq!(request_refresh_rate, 2);
        assert!(extra_params.is_empty());
    }

    #[test]
    fn test_extra_params_repeat() {
        let cli = Cli::try_parse_from([
            "vractl",
            "server",
            "create",
            "cat-1",
            "--extra-param",
            "hostname=string:web-01",
            "--extra-param",
            "disk_gb=integer:40",
        ])
        .unwrap();
        let Commands::Server(ServerCommands::Create { extra_params, .. }) = cli.command else {
            panic!("expected server create");
        };
        let keys: Vec<_> = extra_params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["hostname", "disk_gb"]);
    }

    #[test]
    fn test_extra_param_without_equals_is_rejected() {
        let result = Cli::try_parse_from([
            "vractl",
            "server",
            "create",
            "cat-1",
            "--extra-param",
            "hostname",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vractl", "catalog", "list", "-o", "json", "-p", "lab", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.profile.as_deref(), Some("lab"));
        assert_eq!(cli.verbose, 2);
    }
}
