//! Per-entity side rules around the generic create/update handlers.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;

use crate::auth::{AuthUser, password::hash_password};
use crate::error::ApiError;
use crate::model::notification::Notification;
use crate::model::project::{is_truthy, update_completes};
use crate::model::user::{PASSWORD, without_password};
use crate::model::Resource;
use crate::store::Document;

/// Replaces a plaintext `password` with its hash. An empty one is dropped
/// (the stored hash stays); anything but a string is rejected.
fn hash_password_field(doc: &mut Document) -> Result<(), ApiError> {
    match doc.get(PASSWORD) {
        None => {}
        Some(Value::String(plain)) if plain.is_empty() => {
            doc.remove(PASSWORD);
        }
        Some(Value::String(plain)) => {
            let hashed = hash_password(plain)?;
            doc.insert(PASSWORD.to_string(), Value::String(hashed));
        }
        Some(_) => {
            return Err(ApiError::BadRequest("Password must be a string".to_string()));
        }
    }
    Ok(())
}

/// Fills server-owned fields of a new document.
pub fn before_create(resource: Resource, body: &mut Document, auth: &AuthUser) -> Result<(), ApiError> {
    match resource {
        Resource::User => hash_password_field(body)?,
        Resource::Leave => {
            if !body.get("userId").is_some_and(is_truthy) {
                body.insert("userId".to_string(), auth.id().into());
            }
        }
        Resource::Expense => {
            body.insert("createdBy".to_string(), auth.id().into());
        }
        _ => {}
    }
    Ok(())
}

pub fn before_update(
    resource: Resource,
    patch: &mut Document,
    now: &DateTime<FixedOffset>,
) -> Result<(), ApiError> {
    match resource {
        Resource::User => hash_password_field(patch)?,
        Resource::Project if update_completes(patch) => {
            let stamp = now
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true);
            patch.insert("completedAt".to_string(), Value::String(stamp));
        }
        _ => {}
    }
    Ok(())
}

/// Activity notice recorded after a successful create, if the entity has one.
pub fn notification_for(
    resource: Resource,
    created: &Document,
    auth: &AuthUser,
    now: &DateTime<FixedOffset>,
) -> Option<Notification> {
    let actor = auth.name().unwrap_or("Unknown");
    let (title, description) = match resource {
        Resource::Attendance => (
            "Attendance",
            format!("Employee {actor} checked in at {}", now.format("%H:%M")),
        ),
        Resource::Expense => ("New expense", "A new expense was recorded".to_string()),
        Resource::Project => {
            let name = created.get("name").and_then(Value::as_str).unwrap_or_default();
            ("New project", format!("Created a new project \"{name}\""))
        }
        Resource::Task => ("New task", format!("{actor} created a new task")),
        _ => return None,
    };

    Some(Notification::new(Some(auth.id().to_string()), title, description))
}

/// Shapes a stored document for a response.
pub fn present(resource: Resource, doc: Document) -> Document {
    match resource {
        Resource::User => without_password(doc),
        _ => doc,
    }
}
