use serde::Serialize;
use serde_json::Value;

use crate::store::Document;

/// Activity notice addressed to a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(user_id: Option<String>, title: &str, description: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title: title.to_string(),
            description,
        }
    }

    pub fn into_document(self) -> Document {
        match serde_json::to_value(self) {
            Ok(Value::Object(doc)) => doc,
            _ => Document::new(),
        }
    }
}
