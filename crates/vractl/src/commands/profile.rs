//! Profile management command implementations

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use vractl_core::{CredentialStore, Profile};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::commands::utils::confirm_action;
use crate::connection::ConnectionManager;
use crate::error::{Result as CliResult, VraCtlError};
use crate::output;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            base_url,
            username,
            password,
            tenant,
            page_size,
            insecure,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let update = ProfileUpdate {
                base_url: base_url.clone(),
                username: username.clone(),
                password: password.clone(),
                tenant: tenant.clone(),
                page_size: *page_size,
                insecure: *insecure,
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
                #[cfg(not(feature = "secure-storage"))]
                use_keyring: false,
            };
            handle_set(conn_mgr, name, update)
        }
        Remove { name, yes } => handle_remove(conn_mgr, name, *yes),
        Default { name } => handle_default(conn_mgr, name),
    }
}

/// Profile as shown to the user, with the password reduced to whether it is set
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    is_default: bool,
    base_url: Option<&'a str>,
    username: Option<&'a str>,
    tenant: Option<&'a str>,
    password: &'static str,
    page_size: u32,
    verify_ssl: bool,
    missing: Vec<String>,
}

impl<'a> ProfileView<'a> {
    fn new(name: &'a str, profile: &'a Profile, is_default: bool) -> Self {
        let password = match profile.password.as_deref() {
            None | Some("") => "not set",
            Some(value) if CredentialStore::is_keyring_reference(value) => "keyring",
            Some(_) => "configured",
        };

        Self {
            name,
            is_default,
            base_url: profile.base_url.as_deref(),
            username: profile.username.as_deref(),
            tenant: profile.tenant.as_deref(),
            password,
            page_size: profile.page_size.unwrap_or(vractl_core::DEFAULT_PAGE_SIZE),
            verify_ssl: profile.verify_ssl,
            missing: profile.missing_fields(),
        }
    }
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let default = conn_mgr
        .config
        .resolve_profile_name(None)
        .ok()
        .flatten();
    let profiles: Vec<ProfileView> = conn_mgr
        .config
        .list_profiles()
        .into_iter()
        .map(|(name, profile)| ProfileView::new(name, profile, default.as_deref() == Some(name)))
        .collect();
    trace!("Found {} profiles", profiles.len());

    if output_format.is_structured() {
        let config_path = conn_mgr
            .resolved_config_path()
            .ok()
            .map(|p| p.display().to_string());
        let output_data = serde_json::json!({
            "config_path": config_path,
            "profiles": profiles,
            "count": profiles.len(),
        });
        output::print_output(&output_data, output_format.into(), None)?;
        return Ok(());
    }

    if let Ok(path) = conn_mgr.resolved_config_path() {
        println!("Configuration file: {}", path.display());
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'vractl profile set' to create a profile.");
        return Ok(());
    }

    for view in &profiles {
        let marker = if view.is_default { "*" } else { " " };
        println!(
            "{} {} ({} @ {})",
            marker,
            view.name,
            view.username.unwrap_or("-"),
            view.base_url.unwrap_or("-")
        );
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = conn_mgr.resolved_config_path()?;

    if output_format.is_structured() {
        let output_data = serde_json::json!({
            "config_path": config_path.display().to_string(),
        });
        output::print_output(&output_data, output_format.into(), None)?;
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| VraCtlError::ProfileNotFound { name: name.into() })?;
    let is_default = conn_mgr
        .config
        .resolve_profile_name(None)
        .ok()
        .flatten()
        .as_deref()
        == Some(name);
    let view = ProfileView::new(name, profile, is_default);

    if output_format.is_structured() {
        output::print_output(&view, output_format.into(), None)?;
        return Ok(());
    }

    println!("Profile: {}", view.name);
    println!("Base URL: {}", view.base_url.unwrap_or("-"));
    println!("Username: {}", view.username.unwrap_or("-"));
    println!("Tenant: {}", view.tenant.unwrap_or("-"));
    println!("Password: {}", view.password);
    println!("Page size: {}", view.page_size);
    println!("Verify SSL: {}", view.verify_ssl);
    if view.is_default {
        println!("Default: yes");
    }
    if !view.missing.is_empty() {
        println!("Missing: {}", view.missing.join(", "));
    }
    Ok(())
}

/// Values given to `profile set`
struct ProfileUpdate {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    tenant: Option<String>,
    page_size: Option<u32>,
    insecure: bool,
    use_keyring: bool,
}

impl ProfileUpdate {
    /// Merge into an existing profile; unset values keep what was there
    fn merge(self, existing: Option<&Profile>) -> Profile {
        let existing = existing.cloned().unwrap_or_default();
        Profile {
            username: self.username.or(existing.username),
            password: self.password.or(existing.password),
            base_url: self.base_url.or(existing.base_url),
            tenant: self.tenant.or(existing.tenant),
            page_size: self.page_size.or(existing.page_size),
            verify_ssl: if self.insecure {
                false
            } else {
                existing.verify_ssl
            },
        }
    }
}

fn handle_set(conn_mgr: &ConnectionManager, name: &str, mut update: ProfileUpdate) -> CliResult<()> {
    debug!("Setting profile: {}", name);
    let existing = conn_mgr.config.profiles.get(name);

    let has_password = existing
        .and_then(|p| p.password.as_deref())
        .is_some_and(|p| !p.is_empty());
    if update.password.is_none() && !has_password {
        let password =
            rpassword::prompt_password("Enter password: ").context("Failed to read password")?;
        update.password = Some(password);
    }

    if update.use_keyring
        && let Some(password) = update.password.take()
    {
        let store = CredentialStore::new();
        let reference = store.store(&format!("{}-password", name), &password)?;
        println!("Password stored securely in OS keyring");
        update.password = Some(reference);
    }

    let profile = update.merge(existing);
    let missing = profile.missing_fields();

    let mut config = conn_mgr.config.clone();
    config.set_profile(name.to_string(), profile);
    let path = conn_mgr.save_config(&config)?;

    println!("Profile '{}' saved successfully to:", name);
    println!("  {}", path.display());

    if !missing.is_empty() {
        warn!("Profile '{}' is incomplete: {}", name, missing.join(", "));
        println!();
        println!(
            "Note: the profile still needs: {} (or the matching VRA_* environment variables)",
            missing.join(", ")
        );
    }

    if config.profiles.len() == 1 && config.default_profile.is_none() {
        println!();
        println!("Tip: Set as default with:");
        println!("  vractl profile default {}", name);
    }

    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str, yes: bool) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let Some(existing) = conn_mgr.config.profiles.get(name) else {
        return Err(VraCtlError::ProfileNotFound { name: name.into() });
    };

    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);
    if is_default {
        println!("Warning: '{}' is the default profile.", name);
    }

    if !yes && !confirm_action(&format!("remove profile '{}'", name))? {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    if let Some(password) = existing.password.as_deref()
        && let Err(e) = CredentialStore::new().forget(password)
    {
        warn!("Could not remove keyring entry for '{}': {}", name, e);
    }

    let mut config = conn_mgr.config.clone();
    config.remove_profile(name);
    conn_mgr.save_config(&config)?;

    if is_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Setting default profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(VraCtlError::ProfileNotFound { name: name.into() });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}
