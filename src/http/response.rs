//! Request and response types for the engine

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One GraphQL query or mutation
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlRequest {
    /// Endpoint URL
    pub endpoint: String,
    /// Query or mutation text
    pub query: String,
    /// Variables (may be empty)
    pub variables: JsonObject,
}

impl GraphqlRequest {
    /// Create a request with no variables
    pub fn new(endpoint: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: query.into(),
            variables: JsonObject::new(),
        }
    }

    /// Set a single variable
    #[must_use]
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Merge a variables object into the request
    #[must_use]
    pub fn with_variables(mut self, variables: JsonObject) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Wire body: `{ "query": ..., "variables": ... }`
    pub fn to_body(&self) -> JsonValue {
        json!({
            "query": self.query,
            "variables": self.variables,
        })
    }

    /// Reject empty endpoints, unparseable URLs, and empty queries
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;
        if self.query.trim().is_empty() {
            return Err(Error::invalid_request("query must not be empty"));
        }
        Ok(())
    }
}

/// Check that an endpoint is a non-empty absolute URL
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    if endpoint.trim().is_empty() {
        return Err(Error::invalid_request("endpoint must not be empty"));
    }
    url::Url::parse(endpoint)?;
    Ok(())
}

/// An entry of a response's `errors` array, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Vendor error text
    #[serde(default)]
    pub message: String,
    /// Field path the error applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<JsonValue>>,
    /// Everything else the vendor sent (`extensions`, `locations`, ...)
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ApiError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extra: JsonObject::new(),
        }
    }

    fn from_value(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(s) => Self::new(s.clone()),
            other => serde_json::from_value(other.clone())
                .unwrap_or_else(|_| Self::new(other.to_string())),
        }
    }
}

/// Parsed response of one logical request
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlResponse {
    /// Full parsed body
    pub body: JsonValue,
    /// HTTP status of the final attempt
    pub status: u16,
    /// Value of the configured query-cost header, if sent
    pub cost: Option<String>,
    /// Physical attempts made, including the successful one
    pub attempts: u32,
}

impl GraphqlResponse {
    /// The `data` object, if present and non-null
    pub fn data(&self) -> Option<&JsonValue> {
        self.body.get("data").filter(|d| !d.is_null())
    }

    /// Application-level errors from the `errors` array
    pub fn errors(&self) -> Vec<ApiError> {
        extract_errors(&self.body)
    }

    /// Check if the body carries any application-level errors
    pub fn has_errors(&self) -> bool {
        self.body
            .get("errors")
            .and_then(JsonValue::as_array)
            .is_some_and(|errors| !errors.is_empty())
    }

    /// Take the `data` object, failing if the body carries errors
    pub fn into_data(self) -> Result<JsonValue> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(Error::Application { errors });
        }
        Ok(match self.body {
            JsonValue::Object(mut map) => map.remove("data").unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        })
    }
}

/// Read the `errors` array of a body
pub fn extract_errors(body: &JsonValue) -> Vec<ApiError> {
    body.get("errors")
        .and_then(JsonValue::as_array)
        .map(|errors| errors.iter().map(ApiError::from_value).collect())
        .unwrap_or_default()
}
