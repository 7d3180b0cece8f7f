//! Request options for catalog provisioning
//!
//! Options are collected from the command line into an explicit
//! [`RequestOptions`] value, validated as a whole, and then written into the
//! request template fetched from the platform.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// No catalog item ID was supplied
    MissingCatalogId,
    /// Required parameters that were left unset
    MissingParameters(Vec<String>),
    /// Numeric parameter that must be greater than zero
    NotPositive { name: String },
    /// Extra parameter given as `KEY=` or `KEY=TYPE` without a value
    ExtraParamIncomplete { key: String },
    /// Extra parameter whose type is neither `string` nor `integer`
    InvalidExtraParamType { key: String },
    /// Extra parameter of type `integer` whose value does not parse
    InvalidIntegerValue { key: String, value: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingCatalogId => {
                write!(f, "You must supply a Catalog ID to use for your new server.")
            }
            Violation::MissingParameters(names) => write!(
                f,
                "The following required parameters are missing: {}",
                names.join(", ")
            ),
            Violation::NotPositive { name } => write!(f, "{} must be greater than zero", name),
            Violation::ExtraParamIncomplete { key } => {
                write!(f, "No type and value set for extra parameter {}", key)
            }
            Violation::InvalidExtraParamType { key } => write!(
                f,
                "Invalid parameter type for {} - must be string or integer",
                key
            ),
            Violation::InvalidIntegerValue { key, value } => write!(
                f,
                "Invalid integer value '{}' for extra parameter {}",
                value, key
            ),
        }
    }
}

/// Turn a list of violations into a `Result`
pub fn check(violations: Vec<Violation>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(violations))
    }
}

/// Additional catalog request parameter in `KEY=TYPE:VALUE` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraParam {
    pub key: String,
    pub kind: Option<String>,
    pub value: Option<String>,
}

impl FromStr for ExtraParam {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid extra parameter '{}'. Expected KEY=TYPE:VALUE", s))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Extra parameter '{}' has an empty key", s));
        }

        let (kind, value) = match rest.split_once(':') {
            Some((kind, value)) => (non_empty(kind), non_empty(value)),
            None => (non_empty(rest), None),
        };

        Ok(Self {
            key: key.to_string(),
            kind,
            value,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl ExtraParam {
    /// Check the type and value of this parameter
    pub fn violation(&self) -> Option<Violation> {
        let (Some(kind), Some(value)) = (&self.kind, &self.value) else {
            return Some(Violation::ExtraParamIncomplete {
                key: self.key.clone(),
            });
        };

        match kind.as_str() {
            "string" => None,
            "integer" if value.parse::<i64>().is_ok() => None,
            "integer" => Some(Violation::InvalidIntegerValue {
                key: self.key.clone(),
                value: value.clone(),
            }),
            _ => Some(Violation::InvalidExtraParamType {
                key: self.key.clone(),
            }),
        }
    }

    /// JSON value to send to the platform, if this parameter is valid
    pub fn json_value(&self) -> Option<Value> {
        let value = self.value.as_deref()?;
        match self.kind.as_deref()? {
            "string" => Some(Value::String(value.to_string())),
            "integer" => value.parse::<i64>().ok().map(Value::from),
            _ => None,
        }
    }
}

/// Options for a catalog provisioning request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub catalog_id: String,
    pub cpus: Option<u32>,
    pub memory: Option<u32>,
    pub requested_for: Option<String>,
    pub subtenant_id: Option<String>,
    pub lease_days: Option<u32>,
    pub notes: Option<String>,
    pub extra_params: Vec<ExtraParam>,
}

impl RequestOptions {
    /// Collect every problem with these options
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.catalog_id.trim().is_empty() {
            violations.push(Violation::MissingCatalogId);
        }

        let mut missing = Vec::new();
        if self.cpus.is_none() {
            missing.push("cpus".to_string());
        }
        if self.memory.is_none() {
            missing.push("memory".to_string());
        }
        if self.requested_for.as_deref().is_none_or(str::is_empty) {
            missing.push("requested_for".to_string());
        }
        if !missing.is_empty() {
            violations.push(Violation::MissingParameters(missing));
        }

        for (name, value) in [
            ("cpus", self.cpus),
            ("memory", self.memory),
            ("lease_days", self.lease_days),
        ] {
            if value == Some(0) {
                violations.push(Violation::NotPositive {
                    name: name.to_string(),
                });
            }
        }

        violations.extend(self.extra_params.iter().filter_map(ExtraParam::violation));
        violations
    }

    /// Write these options into a request template from the platform
    ///
    /// The template's `data` object holds one entry per blueprint component;
    /// components are the entries whose value carries its own `data` object.
    pub fn apply_to_template(&self, template: &mut Value) -> Result<()> {
        let root = template.as_object_mut().ok_or_else(|| {
            CoreError::UnexpectedResponse("request template is not a JSON object".to_string())
        })?;

        if let Some(requested_for) = &self.requested_for {
            root.insert("requestedFor".to_string(), Value::from(requested_for.as_str()));
        }
        if let Some(subtenant_id) = &self.subtenant_id {
            root.insert("businessGroupId".to_string(), Value::from(subtenant_id.as_str()));
        }
        if let Some(notes) = &self.notes {
            root.insert("description".to_string(), Value::from(notes.as_str()));
        }

        let data = root
            .get_mut("data")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                CoreError::UnexpectedResponse("request template has no data object".to_string())
            })?;

        for component in data.values_mut() {
            if let Some(component_data) = component.get_mut("data").and_then(Value::as_object_mut)
            {
                self.apply_to_component(component_data);
            }
        }

        if let Some(lease_days) = self.lease_days {
            data.insert("_leaseDays".to_string(), Value::from(lease_days));
        }
        for param in &self.extra_params {
            if let Some(value) = param.json_value() {
                data.insert(param.key.clone(), value);
            }
        }

        Ok(())
    }

    fn apply_to_component(&self, component_data: &mut Map<String, Value>) {
        if let Some(cpus) = self.cpus {
            component_data.insert("cpu".to_string(), Value::from(cpus));
        }
        if let Some(memory) = self.memory {
            component_data.insert("memory".to_string(), Value::from(memory));
        }
        for param in &self.extra_params {
            if component_data.contains_key(&param.key)
                && let Some(value) = param.json_value()
            {
                component_data.insert(param.key.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn valid_options() -> RequestOptions {
        RequestOptions {
            catalog_id: "cat-123".to_string(),
            cpus: Some(2),
            memory: Some(4096),
            requested_for: Some("admin@corp.local".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_extra_param_full() {
        let param: ExtraParam = "disk=integer:40".parse().unwrap();
        assert_eq!(param.key, "disk");
        assert_eq!(param.kind.as_deref(), Some("integer"));
        assert_eq!(param.value.as_deref(), Some("40"));
        assert_eq!(param.json_value(), Some(json!(40)));
    }

    #[test]
    fn test_parse_extra_param_value_with_colon() {
        let param: ExtraParam = "endpoint=string:http://10.0.0.1:8080".parse().unwrap();
        assert_eq!(param.value.as_deref(), Some("http://10.0.0.1:8080"));
        assert_eq!(param.violation(), None);
    }

    #[test]
    fn test_parse_extra_param_without_equals_fails() {
        assert!("disk".parse::<ExtraParam>().is_err());
        assert!("=string:x".parse::<ExtraParam>().is_err());
    }

    #[test]
    fn test_extra_param_missing_value() {
        let param: ExtraParam = "disk=integer".parse().unwrap();
        assert_eq!(
            param.violation(),
            Some(Violation::ExtraParamIncomplete {
                key: "disk".to_string()
            })
        );
        assert_eq!(param.json_value(), None);
    }

    #[test]
    fn test_extra_param_bad_type() {
        let param: ExtraParam = "disk=boolean:true".parse().unwrap();
        assert_eq!(
            param.violation(),
            Some(Violation::InvalidExtraParamType {
                key: "disk".to_string()
            })
        );
    }

    #[test]
    fn test_extra_param_bad_integer() {
        let param: ExtraParam = "disk=integer:forty".parse().unwrap();
        assert!(matches!(
            param.violation(),
            Some(Violation::InvalidIntegerValue { .. })
        ));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_options().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_all_missing_together() {
        let options = RequestOptions {
            catalog_id: String::new(),
            ..Default::default()
        };
        let violations = options.validate();
        assert_eq!(violations[0], Violation::MissingCatalogId);
        assert_eq!(
            violations[1],
            Violation::MissingParameters(vec![
                "cpus".to_string(),
                "memory".to_string(),
                "requested_for".to_string()
            ])
        );
        assert_eq!(
            violations[1].to_string(),
            "The following required parameters are missing: cpus, memory, requested_for"
        );
    }

    #[test]
    fn test_validate_zero_values() {
        let options = RequestOptions {
            cpus: Some(0),
            lease_days: Some(0),
            ..valid_options()
        };
        let violations = options.validate();
        assert_eq!(violations.len(), 2);
        assert!(check(violations).is_err());
    }

    #[test]
    fn test_apply_to_template() {
        let mut template = json!({
            "type": "com.vmware.vcac.catalog.domain.request.CatalogItemProvisioningRequest",
            "catalogItemId": "cat-123",
            "requestedFor": "someone@else",
            "businessGroupId": "bg-default",
            "description": null,
            "data": {
                "_leaseDays": null,
                "vSphere_Machine_1": {
                    "componentTypeId": "com.vmware.csp.component.cafe.composition",
                    "data": {"cpu": 1, "memory": 1024, "folder": "default"}
                },
                "_number_of_instances": 1
            }
        });

        let options = RequestOptions {
            subtenant_id: Some("bg-42".to_string()),
            notes: Some("built by ci".to_string()),
            lease_days: Some(7),
            extra_params: vec![
                "folder=string:web".parse().unwrap(),
                "owner_code=integer:99".parse().unwrap(),
            ],
            ..valid_options()
        };

        options.apply_to_template(&mut template).unwrap();

        assert_eq!(template["requestedFor"], "admin@corp.local");
        assert_eq!(template["businessGroupId"], "bg-42");
        assert_eq!(template["description"], "built by ci");
        assert_eq!(template["data"]["_leaseDays"], 7);
        assert_eq!(template["data"]["owner_code"], 99);
        assert_eq!(template["data"]["folder"], "web");
        let machine = &template["data"]["vSphere_Machine_1"]["data"];
        assert_eq!(machine["cpu"], 2);
        assert_eq!(machine["memory"], 4096);
        assert_eq!(machine["folder"], "web");
        assert!(machine.get("owner_code").is_none());
        assert_eq!(template["data"]["_number_of_instances"], 1);
    }

    #[test]
    fn test_apply_keeps_template_business_group_without_subtenant() {
        let mut template = json!({"businessGroupId": "bg-default", "data": {}});
        valid_options().apply_to_template(&mut template).unwrap();
        assert_eq!(template["businessGroupId"], "bg-default");
        assert!(template["data"].get("_leaseDays").is_none());
    }

    #[test]
    fn test_apply_rejects_template_without_data() {
        let mut template = json!({"catalogItemId": "cat-123"});
        let err = valid_options().apply_to_template(&mut template).unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedResponse(_)));
    }
}
