//! Contact form parsing, validation and the `create_item` mutation.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ContactConfig;
use crate::error::{ApiError, ErrorKind};
use crate::gateway::OutboundRequest;
use crate::security::sanitize::sanitize;
use crate::security::validation::{validate_email, validate_phone};

pub const ENDPOINT: &str = "contact";

const CREATE_ITEM: &str = "mutation CreateItem($boardId: ID!, $itemName: String!, $columnValues: JSON!) { \
     create_item(board_id: $boardId, item_name: $itemName, column_values: $columnValues) { id name } }";

const CREATE_ITEM_IN_GROUP: &str = "mutation CreateItem($boardId: ID!, $groupId: String!, $itemName: String!, $columnValues: JSON!) { \
     create_item(board_id: $boardId, group_id: $groupId, item_name: $itemName, column_values: $columnValues) { id name } }";

/// A lead submitted from the site's contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub subject: Option<String>,
}

impl ContactForm {
    /// Parse and sanitize a JSON body. Does not validate.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let raw: Value = serde_json::from_slice(body).map_err(|_| invalid("Request body must be a JSON object"))?;
        if !raw.is_object() {
            return Err(invalid("Request body must be a JSON object"));
        }
        serde_json::from_value(sanitize(&raw)).map_err(|_| invalid("Contact fields must be strings"))
    }

    /// Required fields and format checks.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(invalid("Name is required"));
        }
        if self.message.is_empty() {
            return Err(invalid("Message is required"));
        }
        if !validate_email(&self.email) {
            return Err(invalid("Invalid email format provided"));
        }
        if let Some(phone) = self.phone() {
            if !validate_phone(phone) {
                return Err(invalid("Invalid phone number format provided"));
            }
        }
        Ok(())
    }

    fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.is_empty())
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }

    /// Column values keyed by the board's column IDs.
    pub fn column_values(&self, columns: &ContactConfig) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert(
            columns.email_column.clone(),
            json!({ "email": self.email, "text": self.email }),
        );
        values.insert(columns.message_column.clone(), json!({ "text": self.message }));
        if let Some(phone) = self.phone() {
            values.insert(columns.phone_column.clone(), json!({ "phone": phone }));
        }
        if let Some(subject) = self.subject() {
            values.insert(columns.subject_column.clone(), Value::String(subject.to_string()));
        }
        values
    }

    /// The `create_item` mutation for this lead.
    pub fn to_request(&self, board_id: &str, columns: &ContactConfig) -> OutboundRequest {
        let item_name: String = self.name.chars().take(columns.max_item_name).collect();
        let column_values = Value::Object(self.column_values(columns)).to_string();

        let mut variables = Map::new();
        variables.insert("boardId".into(), Value::String(board_id.to_string()));
        variables.insert("itemName".into(), Value::String(item_name));
        variables.insert("columnValues".into(), Value::String(column_values));

        let query = match &columns.group_id {
            Some(group) => {
                variables.insert("groupId".into(), Value::String(group.clone()));
                CREATE_ITEM_IN_GROUP
            }
            None => CREATE_ITEM,
        };
        OutboundRequest::from_parts(query, variables)
    }
}

/// The created item from a `create_item` response.
pub fn created_item(body: &Value) -> Result<Value, ApiError> {
    let item = body.pointer("/data/create_item");
    match item.and_then(|i| i.get("id")).filter(|id| !id.is_null()) {
        Some(id) => Ok(json!({
            "id": id,
            "name": item.and_then(|i| i.get("name")).cloned().unwrap_or(Value::Null),
        })),
        None => Err(ApiError::local(
            ErrorKind::Server,
            "Failed to create item: Invalid response structure",
            ENDPOINT,
        )
        .with_details(body.clone())),
    }
}

fn invalid(message: &str) -> ApiError {
    ApiError::local(ErrorKind::Validation, message, ENDPOINT)
}
