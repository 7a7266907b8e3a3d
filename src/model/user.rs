use serde::Deserialize;
use serde_json::Value;

use crate::store::Document;

/// Field holding the argon2 hash; never leaves the server.
pub const PASSWORD: &str = "password";

/// Login view of a user document. Profile fields are stored as sent, so
/// they are kept as raw JSON and only the identifiers are read as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(rename = "_id")]
    pub internal_id: Value,
    pub id: Value,
    pub email: Value,
    pub password: Value,
    pub name: Value,
    pub role: Value,
}

impl User {
    pub fn internal_id(&self) -> Option<&str> {
        self.internal_id.as_str()
    }

    /// External id carried in access tokens.
    pub fn id(&self) -> Option<&str> {
        self.id.as_str()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password.as_str()
    }
}

/// Removes secret fields from a user document.
pub fn without_password(mut doc: Document) -> Document {
    doc.remove(PASSWORD);
    doc
}
