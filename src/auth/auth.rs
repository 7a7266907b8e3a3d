use crate::{error::ApiError, models::Claims, store::Document};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use serde_json::Value;

/// The caller, as attached by the auth middleware: token claims plus the
/// stored user record without its password.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
    pub profile: Document,
}

impl AuthUser {
    /// External id of the user.
    pub fn id(&self) -> &str {
        &self.claims.id
    }

    pub fn name(&self) -> Option<&str> {
        self.profile.get("name").and_then(Value::as_str)
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| {
                    ApiError::Forbidden("A token is required for authentication".to_string())
                }),
        )
    }
}
