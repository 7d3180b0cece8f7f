//! Configuration and profile management for vractl
//!
//! # Features
//!
//! - Multiple named profiles for different platform instances
//! - Secure password storage using the OS keyring (optional)
//! - Environment variable expansion in config files
//! - Environment variable overrides for every connection setting

// Nested config module is intentional for the config subsystem
#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;

pub use config::{Config, Credentials, Profile};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
