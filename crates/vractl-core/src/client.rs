//! HTTP client for the catalog service
//!
//! Authenticates against the identity service with username, password and
//! tenant, then talks to the consumer catalog API with a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, trace};
use url::Url;

use crate::error::{CoreError, Result};
use crate::models::{CatalogItem, EntitledCatalogItem, Page, RequestDetails, Resource, Token};
use crate::params::{self, RequestOptions, Violation};
use crate::progress::RequestHandle;

/// Default number of items fetched per page
pub const DEFAULT_PAGE_SIZE: u32 = 200;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const TOKEN_PATH: &str = "/identity/api/tokens";
const CATALOG_ITEMS_PATH: &str = "/catalog-service/api/consumer/catalogItems";
const ENTITLED_ITEMS_PATH: &str = "/catalog-service/api/consumer/entitledCatalogItems";
const REQUESTS_PATH: &str = "/catalog-service/api/consumer/requests";

/// Builder for [`VraClient`]
#[derive(Debug, Clone)]
pub struct VraClientBuilder {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    tenant: Option<String>,
    page_size: u32,
    verify_ssl: bool,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for VraClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            tenant: None,
            page_size: DEFAULT_PAGE_SIZE,
            verify_ssl: true,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

impl VraClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<VraClient> {
        let base_url = self.base_url.unwrap_or_default();
        let username = self.username.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        let tenant = self.tenant.unwrap_or_default();

        let missing: Vec<String> = [
            ("vra_username", &username),
            ("vra_password", &password),
            ("vra_base_url", &base_url),
            ("vra_tenant", &tenant),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation(vec![Violation::MissingParameters(
                missing,
            )]));
        }

        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| CoreError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        if self.page_size == 0 {
            return Err(CoreError::Config("page size must be greater than zero".to_string()));
        }

        let mut http = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl);
        if let Some(user_agent) = &self.user_agent {
            http = http.user_agent(user_agent.as_str());
        }

        Ok(VraClient {
            http: http.build()?,
            base_url,
            username,
            password,
            tenant,
            page_size: self.page_size,
            token: Arc::new(Mutex::new(None)),
        })
    }
}

/// Authenticated client for the catalog service
#[derive(Clone)]
pub struct VraClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    tenant: String,
    page_size: u32,
    token: Arc<Mutex<Option<String>>>,
}

impl std::fmt::Debug for VraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VraClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("tenant", &self.tenant)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl VraClient {
    pub fn builder() -> VraClientBuilder {
        VraClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for `path` followed by `segments`, each encoded as one path segment
    fn endpoint(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| CoreError::Config(format!("Invalid request URL for {}: {}", path, e)))?;
        if segments.is_empty() {
            return Ok(url);
        }

        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(CoreError::Config(format!("Invalid identifier '{}'", bad)));
        }
        url.path_segments_mut()
            .map_err(|_| CoreError::Config(format!("Base URL cannot be extended: {}", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    /// Bearer token, logging in on first use
    async fn token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Ok(existing.clone());
        }

        debug!("Requesting token for {} in tenant {}", self.username, self.tenant);
        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&json!({
                "username": self.username,
                "password": self.password,
                "tenant": self.tenant,
            }))
            .send()
            .await?;
        let issued: Token = parse_response(response).await?;
        trace!("Token expires: {:?}", issued.expires);
        info!("Authenticated to {} as {}", self.base_url, self.username);

        *token = Some(issued.id.clone());
        Ok(issued.id)
    }

    async fn get<T: DeserializeOwned>(&self, mut url: Url, query: &[(&str, String)]) -> Result<T> {
        let token = self.token().await?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        trace!("GET {}", url);
        let response = self.http.get(url).bearer_auth(token).send().await?;
        parse_response(response).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T> {
        let token = self.token().await?;
        trace!("POST {}", url);
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Fetch every page of a paged collection
    async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            let page: Page<T> = self
                .get(
                    url.clone(),
                    &[
                        ("page", page_number.to_string()),
                        ("limit", self.page_size.to_string()),
                    ],
                )
                .await?;
            items.extend(page.content);

            let total_pages = page.metadata.map(|m| m.total_pages).unwrap_or(1);
            debug!("Fetched page {} of {} from {}", page_number, total_pages, url.path());
            if page_number >= total_pages {
                break;
            }
            page_number += 1;
        }

        Ok(items)
    }

    /// List catalog items, optionally only those the user is entitled to
    pub async fn list_catalog_items(&self, entitled_only: bool) -> Result<Vec<CatalogItem>> {
        if entitled_only {
            let items: Vec<EntitledCatalogItem> = self
                .get_all_pages(self.endpoint(ENTITLED_ITEMS_PATH, &[])?)
                .await?;
            Ok(items.into_iter().map(|i| i.catalog_item).collect())
        } else {
            self.get_all_pages(self.endpoint(CATALOG_ITEMS_PATH, &[])?)
                .await
        }
    }

    /// Request template for an entitled catalog item
    pub async fn request_template(&self, catalog_id: &str) -> Result<Value> {
        let url = self.endpoint(ENTITLED_ITEMS_PATH, &[catalog_id, "requests", "template"])?;
        self.get(url, &[]).await
    }

    /// Submit a filled-in request template
    pub async fn submit_request(&self, catalog_id: &str, template: &Value) -> Result<CatalogRequest> {
        let url = self.endpoint(ENTITLED_ITEMS_PATH, &[catalog_id, "requests"])?;
        let submitted: Value = self.post(url, template).await?;

        let id = submitted
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                CoreError::UnexpectedResponse("submitted request has no id".to_string())
            })?;
        info!("Submitted request {} for catalog item {}", id, catalog_id);

        Ok(CatalogRequest::new(self.clone(), id))
    }

    /// Validate options, fill in the catalog item's template and submit it
    pub async fn provision(&self, options: &RequestOptions) -> Result<CatalogRequest> {
        params::check(options.validate())?;

        let mut template = self.request_template(&options.catalog_id).await?;
        options.apply_to_template(&mut template)?;
        trace!("Request payload: {}", template);

        self.submit_request(&options.catalog_id, &template).await
    }

    /// Current state of a request
    pub async fn get_request(&self, request_id: &str) -> Result<RequestDetails> {
        self.get(self.endpoint(REQUESTS_PATH, &[request_id])?, &[])
            .await
    }

    /// Resources created by a request
    pub async fn request_resources(&self, request_id: &str) -> Result<Vec<Resource>> {
        self.get_all_pages(self.endpoint(REQUESTS_PATH, &[request_id, "resourceViews"])?)
            .await
    }
}

/// Turn a response into a typed body or an API error
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.text().await?;
        // 201/204 responses may come back without a body
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        return serde_json::from_str(body)
            .map_err(|e| CoreError::UnexpectedResponse(format!("{} (HTTP {})", e, status)));
    }

    let body = response.text().await.unwrap_or_default();
    Err(CoreError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Pull the most useful message out of an error body
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_errors = parsed.as_ref().and_then(|v| {
        let first = v.get("errors")?.as_array()?.first()?;
        first
            .get("systemMessage")
            .or_else(|| first.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let from_message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    from_errors.or(from_message).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.trim().to_string()
        }
    })
}

/// A submitted catalog request
#[derive(Debug, Clone)]
pub struct CatalogRequest {
    client: VraClient,
    id: String,
    details: Option<RequestDetails>,
}

impl CatalogRequest {
    pub fn new(client: VraClient, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
            details: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// State from the last refresh
    pub fn details(&self) -> Option<&RequestDetails> {
        self.details.as_ref()
    }

    pub fn is_successful(&self) -> bool {
        self.details.as_ref().is_some_and(RequestDetails::is_successful)
    }

    pub fn is_failed(&self) -> bool {
        self.details.as_ref().is_some_and(RequestDetails::is_failed)
    }

    pub fn completion_details(&self) -> Option<&str> {
        self.details.as_ref().and_then(RequestDetails::completion_details)
    }

    /// Fail with the platform's completion details if the request failed
    pub fn ensure_succeeded(&self) -> Result<()> {
        if self.is_failed() {
            return Err(CoreError::RequestFailed(
                self.completion_details()
                    .unwrap_or("no completion details reported")
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Resources created by this request
    pub async fn resources(&self) -> Result<Vec<Resource>> {
        self.client.request_resources(&self.id).await
    }
}

#[async_trait]
impl RequestHandle for CatalogRequest {
    async fn refresh(&mut self) -> Result<()> {
        self.details = Some(self.client.get_request(&self.id).await?);
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.details.as_ref().is_some_and(RequestDetails::is_completed)
    }

    fn status(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.phase.as_deref())
    }
}
