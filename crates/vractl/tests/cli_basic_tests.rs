use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test command isolated from the caller's environment
fn vractl() -> Command {
    let mut cmd = Command::cargo_bin("vractl").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("VRACTL_PROFILE")
        .env_remove("VRACTL_CONFIG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

fn config_arg(path: &Path) -> String {
    path.display().to_string()
}

const LAB_CONFIG: &str = r#"
default_profile = "lab"

[profiles.lab]
username = "admin@corp.local"
password = "s3cret"
base_url = "https://vra.lab.local"
tenant = "lab"

[profiles.prod]
username = "svc@corp.local"
password = "keyring:prod-password"
base_url = "https://vra.corp.local"
tenant = "corp"
"#;

#[test]
fn test_help_flag() {
    vractl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("vRA service catalog"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    vractl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vractl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    vractl()
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"vractl\""));
}

#[test]
fn test_no_args_shows_help() {
    vractl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    vractl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_server_create_help_lists_defaults() {
    vractl()
        .args(["server", "create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--server-create-timeout"))
        .stdout(predicate::str::contains("[default: 600]"))
        .stdout(predicate::str::contains("--request-refresh-rate"))
        .stdout(predicate::str::contains("KEY=TYPE:VALUE"));
}

#[test]
fn test_server_create_requires_catalog_id() {
    vractl()
        .args(["server", "create"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("<CATALOG_ID>"));
}

#[test]
fn test_invalid_output_format() {
    vractl()
        .args(["profile", "list", "-o", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_completions_bash() {
    vractl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vractl"));
}

#[test]
fn test_profile_list_empty_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    vractl()
        .args(["--config-file", &config_arg(&path), "profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured."));
}

#[test]
fn test_profile_list_json() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    let output = vractl()
        .args(["--config-file", &config_arg(&path), "profile", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 2);
    assert_eq!(json["profiles"][0]["name"], "lab");
    assert_eq!(json["profiles"][0]["is_default"], true);
    assert_eq!(json["profiles"][1]["password"], "keyring");
}

#[test]
fn test_profile_show_hides_password() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    vractl()
        .args(["--config-file", &config_arg(&path), "profile", "show", "lab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Base URL: https://vra.lab.local"))
        .stdout(predicate::str::contains("Password: configured"))
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn test_profile_show_unknown() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    vractl()
        .args(["--config-file", &config_arg(&path), "profile", "show", "staging"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'staging' not found"))
        .stderr(predicate::str::contains("vractl profile list"));
}

#[test]
fn test_profile_set_default_and_remove() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let config = config_arg(&path);

    vractl()
        .args([
            "--config-file",
            &config,
            "profile",
            "set",
            "lab",
            "--base-url",
            "https://vra.lab.local",
            "--username",
            "admin",
            "--password",
            "pw",
            "--tenant",
            "lab",
            "--insecure",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' saved successfully"));

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("verify_ssl = false"));

    vractl()
        .args(["--config-file", &config, "profile", "default", "lab"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default profile set to 'lab'."));
    assert!(
        fs::read_to_string(&path)
            .unwrap()
            .contains("default_profile = \"lab\"")
    );

    vractl()
        .args(["--config-file", &config, "profile", "remove", "lab", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'lab' removed successfully."));

    let saved = fs::read_to_string(&path).unwrap();
    assert!(!saved.contains("[profiles.lab]"));
    assert!(!saved.contains("default_profile"));
}

#[test]
fn test_profile_set_reports_incomplete_profile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    vractl()
        .args([
            "--config-file",
            &config_arg(&path),
            "profile",
            "set",
            "partial",
            "--username",
            "admin",
            "--password",
            "pw",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("vra_base_url, vra_tenant"));
}

#[test]
fn test_profile_path_with_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    vractl()
        .args(["--config-file", &config_arg(&path), "profile", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_missing_profile_values_are_listed_together() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[profiles.partial]
base_url = "https://vra.lab.local"
"#,
    );

    vractl()
        .args(["--config-file", &config_arg(&path), "catalog", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "The following required parameters are missing: vra_username, vra_password, vra_tenant",
        ));
}

#[test]
fn test_no_profiles_with_config_file_ignores_env() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    vractl()
        .env("VRA_USERNAME", "admin")
        .env("VRA_PASSWORD", "pw")
        .env("VRA_BASE_URL", "https://vra.lab.local")
        .env("VRA_TENANT", "lab")
        .args(["--config-file", &config_arg(&path), "catalog", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No profile configured"));
}

#[test]
fn test_server_create_rejects_zero_refresh_rate() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    vractl()
        .args([
            "--config-file",
            &config_arg(&path),
            "server",
            "create",
            "cat-1",
            "--cpus",
            "1",
            "--memory",
            "512",
            "--request-refresh-rate",
            "0",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "refresh_rate must be greater than zero",
        ));
}

#[test]
fn test_server_create_reports_every_invalid_option() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LAB_CONFIG);

    vractl()
        .args([
            "--config-file",
            &config_arg(&path),
            "server",
            "create",
            "cat-1",
            "--extra-param",
            "hostname=",
            "--extra-param",
            "flavor=float:1.5",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "The following required parameters are missing: cpus, memory",
        ))
        .stderr(predicate::str::contains(
            "No type and value set for extra parameter hostname",
        ))
        .stderr(predicate::str::contains(
            "Invalid parameter type for flavor - must be string or integer",
        ));
}
