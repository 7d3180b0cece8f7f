//! Connection management for the catalog client

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info, trace};
use vractl_core::{Config, VraClient};

use crate::error::Result as CliResult;

/// User agent string for vractl HTTP requests
const VRACTL_USER_AGENT: &str = concat!("vractl/", env!("CARGO_PKG_VERSION"));

/// Holds the loaded configuration and creates authenticated clients from it
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a connection manager, remembering an explicit config path if one was given
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Path the configuration is read from and saved to
    pub fn resolved_config_path(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Save `config` to the location this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<PathBuf> {
        let path = self.resolved_config_path()?;
        config
            .save_to_path(&path)
            .context("Failed to save configuration")?;
        debug!("Configuration saved to {:?}", path);
        Ok(path)
    }

    /// Create a catalog client from profile credentials with environment variable override support
    ///
    /// When --config-file is explicitly specified, environment variables are ignored so the
    /// file alone determines the connection.
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<VraClient> {
        debug!("Creating vRA client");
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let credentials = self.config.resolve_credentials(profile_name, use_env_vars)?;
        info!(
            "Connecting to {} as {} (tenant {})",
            credentials.base_url, credentials.username, credentials.tenant
        );
        if !credentials.verify_ssl {
            debug!("TLS certificate verification disabled");
        }

        let client = credentials
            .client_builder()
            .user_agent(VRACTL_USER_AGENT)
            .build()?;
        Ok(client)
    }
}
