//! Configuration management for vractl
//!
//! Connection settings live in a TOML file with one named profile per
//! platform instance. Values can be overridden from the environment and
//! secrets can be kept in the OS keyring.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::client::{DEFAULT_PAGE_SIZE, VraClientBuilder};

/// Environment variable overriding the profile username
pub const ENV_USERNAME: &str = "VRA_USERNAME";
/// Environment variable overriding the profile password
pub const ENV_PASSWORD: &str = "VRA_PASSWORD";
/// Environment variable overriding the profile base URL
pub const ENV_BASE_URL: &str = "VRA_BASE_URL";
/// Environment variable overriding the profile tenant
pub const ENV_TENANT: &str = "VRA_TENANT";
/// Environment variable overriding the page size
pub const ENV_PAGE_SIZE: &str = "VRA_PAGE_SIZE";
/// Set to `true` or `1` to skip TLS certificate verification
pub const ENV_DISABLE_SSL_VERIFY: &str = "VRA_DISABLE_SSL_VERIFY";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Connection settings for one platform instance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Plaintext password or `keyring:<key>` reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_verify_ssl() -> bool {
    true
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: None,
            tenant: None,
            page_size: None,
            verify_ssl: default_verify_ssl(),
        }
    }
}

/// Fully resolved connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub base_url: String,
    pub tenant: String,
    pub page_size: u32,
    pub verify_ssl: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("tenant", &self.tenant)
            .field("page_size", &self.page_size)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl Credentials {
    /// Client builder preloaded with these settings
    pub fn client_builder(&self) -> VraClientBuilder {
        VraClientBuilder::default()
            .base_url(&self.base_url)
            .username(&self.username)
            .password(&self.password)
            .tenant(&self.tenant)
            .page_size(self.page_size)
            .verify_ssl(self.verify_ssl)
    }
}

impl Profile {
    /// Names of required settings this profile leaves unset
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("vra_username", &self.username),
            ("vra_password", &self.password),
            ("vra_base_url", &self.base_url),
            ("vra_tenant", &self.tenant),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name.to_string())
        .collect()
    }

    /// Resolve this profile into usable credentials
    ///
    /// Resolution order per field: environment variable (when `use_env` is
    /// set), keyring reference, plaintext value. All missing fields are
    /// reported in one error.
    pub fn resolve_credentials(&self, use_env: bool) -> Result<Credentials> {
        let env = |name: &str| {
            if use_env {
                std::env::var(name).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        };

        let merged = Profile {
            username: env(ENV_USERNAME).or_else(|| self.username.clone()),
            password: env(ENV_PASSWORD).or_else(|| self.password.clone()),
            base_url: env(ENV_BASE_URL).or_else(|| self.base_url.clone()),
            tenant: env(ENV_TENANT).or_else(|| self.tenant.clone()),
            page_size: env(ENV_PAGE_SIZE)
                .and_then(|v| v.parse().ok())
                .or(self.page_size),
            verify_ssl: env(ENV_DISABLE_SSL_VERIFY)
                .map(|v| !(v.eq_ignore_ascii_case("true") || v == "1"))
                .unwrap_or(self.verify_ssl),
        };

        let missing = merged.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::MissingValues { missing });
        }

        let store = CredentialStore::new();
        let password = store
            .resolve(merged.password.as_deref().unwrap_or_default())
            .map_err(|e| ConfigError::CredentialError(format!("password: {}", e)))?;

        Ok(Credentials {
            username: merged.username.unwrap_or_default(),
            password,
            base_url: merged.base_url.unwrap_or_default(),
            tenant: merged.tenant.unwrap_or_default(),
            page_size: merged.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            verify_ssl: merged.verify_ssl,
        })
    }
}

impl Config {
    /// Name of the profile to use
    ///
    /// Resolution order: explicit name, configured default, alphabetically
    /// first profile. Returns `None` when no profile exists.
    pub fn resolve_profile_name(&self, explicit_profile: Option<&str>) -> Result<Option<String>> {
        if let Some(name) = explicit_profile {
            if !self.profiles.contains_key(name) {
                return Err(ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
            }
            return Ok(Some(name.to_string()));
        }

        if let Some(default) = &self.default_profile {
            return Ok(Some(default.clone()));
        }

        Ok(self.list_profiles().first().map(|(name, _)| name.to_string()))
    }

    /// Resolve credentials for a profile
    ///
    /// With no profile configured at all, credentials may still come entirely
    /// from the environment.
    pub fn resolve_credentials(
        &self,
        explicit_profile: Option<&str>,
        use_env: bool,
    ) -> Result<Credentials> {
        match self.resolve_profile_name(explicit_profile)? {
            Some(name) => {
                debug!("Using profile '{}'", name);
                let profile = self
                    .profiles
                    .get(&name)
                    .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
                profile.resolve_credentials(use_env)
            }
            None if use_env => {
                debug!("No profiles configured, using environment only");
                Profile::default().resolve_credentials(true)
            }
            None => Err(ConfigError::NoProfiles),
        }
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS an existing `~/.config/vractl` directory wins over
    /// `~/Library/Application Support`.
    ///
    /// On Linux: ~/.config/vractl/config.toml
    /// On Windows: %APPDATA%\vractl\vractl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("vractl")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .map(|p| p.exists())
                    .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("io", "vractl", "vractl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables are left as-is so profiles that are not in use do not
    /// need their variables defined.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}
