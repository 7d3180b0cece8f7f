//! # vractl-core
//!
//! Library layer behind the `vractl` CLI: profile configuration, an HTTP
//! client for the catalog and identity services, request parameter
//! validation, and the request poller used after provisioning.
//!
//! ## Example
//!
//! ```no_run
//! use vractl_core::{Config, PollSettings, RequestOptions, wait_for_request};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let client = config.resolve_credentials(None, true)?.client_builder().build()?;
//!
//! let options = RequestOptions {
//!     catalog_id: "5dcd1900-3b89-433d-8563-9606ae1249b8".to_string(),
//!     cpus: Some(2),
//!     memory: Some(4096),
//!     requested_for: Some(client.username().to_string()),
//!     ..Default::default()
//! };
//! let mut request = client.provision(&options).await?;
//! wait_for_request(&mut request, &PollSettings::default(), &mut std::io::stdout()).await?;
//! request.ensure_succeeded()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod params;
pub mod progress;

pub use client::{CatalogRequest, DEFAULT_PAGE_SIZE, VraClient, VraClientBuilder};
pub use config::{Config, ConfigError, CredentialStore, Credentials, Profile};
pub use error::{CoreError, Result};
pub use models::{CatalogItem, RequestDetails, Resource};
pub use params::{ExtraParam, RequestOptions, Violation};
pub use progress::{
    DEFAULT_REFRESH_RATE, DEFAULT_WAIT_TIME, PollSettings, ProgressUpdate, RequestHandle,
    StatusTracker, status_line, wait_for_request,
};
