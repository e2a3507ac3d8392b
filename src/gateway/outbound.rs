//! Validated outbound GraphQL request.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::security::sanitize::sanitize_map;

/// Why an inbound body was refused before any upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRejection {
    /// Body is not JSON, or `query` is missing or not a string.
    InvalidQuery,
    /// `query` is blank after trimming.
    EmptyQuery,
    /// `variables` is present but not an object.
    InvalidVariables,
}

impl QueryRejection {
    pub fn code(&self) -> &'static str {
        match self {
            QueryRejection::InvalidQuery => "INVALID_QUERY",
            QueryRejection::EmptyQuery => "EMPTY_QUERY",
            QueryRejection::InvalidVariables => "INVALID_VARIABLES",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            QueryRejection::InvalidQuery => "Request body must contain a string 'query' field",
            QueryRejection::EmptyQuery => "Query cannot be empty",
            QueryRejection::InvalidVariables => "'variables' must be an object",
        }
    }
}

impl fmt::Display for QueryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for QueryRejection {}

/// A GraphQL document and its sanitized variables, ready to send upstream.
///
/// Serializes as `{"query": ..., "variables": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    #[serde(rename = "query")]
    operation_text: String,
    variables: Map<String, Value>,
}

impl OutboundRequest {
    /// Validate an inbound `{query, variables?}` body.
    ///
    /// The operation text is trimmed but otherwise untouched. Variables run
    /// through the sanitizer.
    pub fn new(body: &Value) -> Result<Self, QueryRejection> {
        let query = body
            .get("query")
            .and_then(Value::as_str)
            .ok_or(QueryRejection::InvalidQuery)?;

        let operation_text = query.trim();
        if operation_text.is_empty() {
            return Err(QueryRejection::EmptyQuery);
        }

        let variables = match body.get("variables") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => sanitize_map(map),
            Some(_) => return Err(QueryRejection::InvalidVariables),
        };

        Ok(Self {
            operation_text: operation_text.to_string(),
            variables,
        })
    }

    /// Build a request from trusted, server-side parts.
    pub fn from_parts(operation_text: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            operation_text: operation_text.into(),
            variables,
        }
    }

    pub fn operation_text(&self) -> &str {
        &self.operation_text
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }
}
