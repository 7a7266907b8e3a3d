use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::ApiError,
    model::{Resource, user::User},
    models::{LoginData, LoginReqDto},
    store::{Document, DocumentStore, Filter, timestamp_now},
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = Object, example = json!({
            "data": {
                "token": "eyJhbGciOiJIUzI1NiJ9...",
                "id": "5f0c1e2a-0d7c-4f7e-9a51-8c2f6c1d7a10",
                "email": "admin@company.com",
                "name": "Admin",
                "role": "admin"
            }
        })),
        (status = 404, description = "Missing credentials, unknown email or wrong password", body = Object, example = json!({
            "data": "User not found!"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, body),
    fields(email = %body.email.as_deref().unwrap_or_default())
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<dyn DocumentStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let (Some(email), Some(password)) = (
        body.email.as_deref().filter(|e| !e.is_empty()),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        info!("Validation failed: empty email or password");
        return Err(ApiError::NotFound("Email and password are required!".to_string()));
    };

    debug!("Fetching user from store");

    let collection = Resource::User.collection();
    let Some(doc) = store.find_one(collection, &Filter::eq("email", email)).await? else {
        info!("Invalid credentials: user not found");
        return Err(ApiError::NotFound("User not found!".to_string()));
    };

    let user: User = serde_json::from_value(doc.into()).map_err(|e| {
        error!(error = %e, "Stored user is malformed");
        ApiError::Internal(e.to_string())
    })?;

    if !verify_password(password, user.password_hash().unwrap_or_default()) {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::NotFound("Password is not valid!".to_string()));
    }

    let id = user.id().unwrap_or_default().to_string();
    let token = generate_access_token(&id, &config.jwt_secret, config.access_token_ttl)?;

    // lastActive is informational, a failed write does not fail the login
    if let Some(internal_id) = user.internal_id() {
        let mut patch = Document::new();
        patch.insert("lastActive".to_string(), timestamp_now());
        if let Err(e) = store.update_by_id(collection, internal_id, patch).await {
            error!(error = %e, "Failed to update lastActive");
        }
    }

    info!(user_id = %id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "data": LoginData {
            token,
            id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    })))
}

/// Token refresh is not offered; clients sign in again.
#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 501, description = "Refresh tokens are not issued", body = Object, example = json!({
            "data": "Token refresh is not supported"
        }))
    ),
    tag = "Auth"
)]
pub async fn refresh_token() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotImplemented(
        "Token refresh is not supported".to_string(),
    ))
}
