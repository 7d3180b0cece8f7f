//! Typed views of catalog service responses
//!
//! Only the fields vractl reads are modelled; everything else in a response
//! is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a paged collection
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
}

/// A provisionable catalog item (blueprint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(default)]
    pub tenant_ref: Option<String>,
    #[serde(default)]
    pub subtenant_ref: Option<String>,
    #[serde(default)]
    pub subtenant_label: Option<String>,
}

impl CatalogItem {
    /// Display name of the business group owning this item
    pub fn subtenant_name(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .and_then(|o| o.subtenant_label.as_deref())
    }

    /// ID of the business group owning this item
    pub fn subtenant_id(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .and_then(|o| o.subtenant_ref.as_deref())
    }
}

/// Wrapper used by the entitled catalog items endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitledCatalogItem {
    pub catalog_item: CatalogItem,
}

/// Login token issued by the identity service
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub expires: Option<String>,
}

/// State of a catalog request as reported by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub id: String,
    #[serde(default)]
    pub request_number: Option<u64>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub date_submitted: Option<String>,
    #[serde(default)]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub requested_for: Option<String>,
    #[serde(default)]
    pub request_completion: Option<RequestCompletion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCompletion {
    #[serde(default)]
    pub request_completion_state: Option<String>,
    #[serde(default)]
    pub completion_details: Option<String>,
}

impl RequestDetails {
    pub fn is_successful(&self) -> bool {
        self.phase.as_deref() == Some("SUCCESSFUL")
    }

    pub fn is_failed(&self) -> bool {
        self.phase.as_deref() == Some("FAILED")
    }

    pub fn is_completed(&self) -> bool {
        self.is_successful() || self.is_failed()
    }

    pub fn completion_details(&self) -> Option<&str> {
        self.request_completion
            .as_ref()
            .and_then(|c| c.completion_details.as_deref())
    }
}

/// A resource created by a catalog request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub resource_id: String,
    pub name: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Resource {
    /// Whether this resource is a machine
    pub fn is_server(&self) -> bool {
        matches!(
            self.resource_type.as_deref(),
            Some("Infrastructure.Virtual" | "Infrastructure.Cloud")
        )
    }

    /// IP addresses reported for this machine, in network order
    pub fn ip_addresses(&self) -> Vec<String> {
        let mut addresses = Vec::new();

        if let Some(ip) = self.data.get("ip_address").and_then(Value::as_str)
            && !ip.is_empty()
        {
            addresses.push(ip.to_string());
        }

        if let Some(networks) = self.data.get("NETWORK_LIST").and_then(Value::as_array) {
            for network in networks {
                if let Some(ip) = network
                    .pointer("/data/NETWORK_ADDRESS")
                    .and_then(Value::as_str)
                    && !ip.is_empty()
                    && !addresses.iter().any(|a| a == ip)
                {
                    addresses.push(ip.to_string());
                }
            }
        }

        addresses
    }

    /// Address a bootstrap step would connect to: first IP, else the name
    pub fn bootstrap_address(&self) -> String {
        self.ip_addresses()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.name.clone())
    }
}
