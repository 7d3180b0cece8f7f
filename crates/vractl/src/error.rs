//! Error types for vractl
//!
//! Maps library errors onto user-facing categories and renders them as
//! cargo-style diagnostics.

use colored::Colorize;
use thiserror::Error;
use vractl_core::{ConfigError, CoreError};

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: List available profiles: vractl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the vractl application
#[derive(Error, Debug)]
pub enum VraCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'vractl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("{message}")]
    MissingParameters { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error(
        "Request did not complete in {seconds} seconds. Check the Requests tab in the vRA UI for more information."
    )]
    RequestTimeout { seconds: u64 },

    #[error("{message}")]
    RequestFailed { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for vractl operations
pub type Result<T> = std::result::Result<T, VraCtlError>;

impl VraCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            VraCtlError::ProfileNotFound { name } => vec![
                "List available profiles: vractl profile list".to_string(),
                format!("Create profile '{}': vractl profile set {}", name, name),
            ],
            VraCtlError::NoProfileConfigured => vec![
                "Create a profile: vractl profile set <name> --base-url <url> --username <user> --tenant <tenant>".to_string(),
                "Or set VRA_USERNAME, VRA_PASSWORD, VRA_BASE_URL and VRA_TENANT".to_string(),
            ],
            VraCtlError::MissingParameters { .. } => vec![
                "Check profile details: vractl profile show <profile>".to_string(),
                "Verify environment variables are set correctly".to_string(),
            ],
            VraCtlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: vractl profile show <profile>".to_string(),
                "Verify the tenant matches the one your user belongs to".to_string(),
            ],
            VraCtlError::ConnectionError { message }
                if message.contains("certificate") || message.contains("SSL") =>
            {
                vec![
                    "For self-signed certificates, update the profile: vractl profile set <name> --insecure".to_string(),
                    "Check that the base URL is correct and reachable".to_string(),
                ]
            }
            VraCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the base URL is correct: vractl profile show <profile>".to_string(),
            ],
            VraCtlError::ApiError { message } if message.contains("404") => vec![
                "Verify the ID is correct".to_string(),
                "List catalog items to find the correct ID: vractl catalog list --entitled-only"
                    .to_string(),
            ],
            VraCtlError::InvalidInput { .. } => {
                vec!["Check the command syntax: vractl <command> --help".to_string()]
            }
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());

        if let VraCtlError::RequestFailed { .. } = self {
            diag = diag.detail("Check the Requests tab in the vRA UI for more information.");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for VraCtlError {
    fn from(err: CoreError) -> Self {
        if err.is_unauthorized() {
            return VraCtlError::AuthenticationFailed {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::RequestTimeout(duration) => VraCtlError::RequestTimeout {
                seconds: duration.as_secs(),
            },
            CoreError::RequestFailed(_) => VraCtlError::RequestFailed {
                message: err.to_string(),
            },
            CoreError::Validation(_) => VraCtlError::InvalidInput {
                message: err.to_string(),
            },
            CoreError::Http(ref http_err) if http_err.is_connect() || http_err.is_timeout() => {
                VraCtlError::ConnectionError {
                    message: http_err.to_string(),
                }
            }
            CoreError::Config(message) => VraCtlError::Configuration(message),
            CoreError::Output(io_err) => VraCtlError::OutputError {
                message: io_err.to_string(),
            },
            _ => VraCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for VraCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => VraCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles => VraCtlError::NoProfileConfigured,
            ConfigError::MissingValues { .. } => VraCtlError::MissingParameters {
                message: err.to_string(),
            },
            _ => VraCtlError::Configuration(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for VraCtlError {
    fn from(err: serde_json::Error) -> Self {
        VraCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for VraCtlError {
    fn from(err: std::io::Error) -> Self {
        VraCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for VraCtlError {
    fn from(err: anyhow::Error) -> Self {
        VraCtlError::Configuration(format!("{:#}", err))
    }
}
