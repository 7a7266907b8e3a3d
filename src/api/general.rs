use actix_web::{HttpResponse, web};
use serde_json::{Value, json};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::PASSWORD;
use crate::model::Resource;
use crate::models::InstallReq;
use crate::store::{DocumentStore, Filter};

/// Whether the panel has been installed
#[utoipa::path(
    get,
    path = "/api/initial",
    responses(
        (status = 200, description = "A settings record or an admin exists", body = Object, example = json!({
            "data": "Found"
        })),
        (status = 400, description = "Fresh installation", body = Object, example = json!({
            "data": "Not found"
        }))
    ),
    tag = "General"
)]
pub async fn initial(store: web::Data<dyn DocumentStore>) -> Result<HttpResponse, ApiError> {
    let setting = store
        .find_one(Resource::Setting.collection(), &Filter::new())
        .await?;
    let admin = store
        .find_one(
            Resource::User.collection(),
            &Filter::eq("role", Role::Admin.as_str()),
        )
        .await?;

    if setting.is_none() && admin.is_none() {
        return Err(ApiError::BadRequest("Not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "data": "Found" })))
}

/// First-run setup: the admin account and the settings record
#[utoipa::path(
    post,
    path = "/api/install",
    request_body = InstallReq,
    responses(
        (status = 200, description = "Installed", body = Object, example = json!({
            "data": "Success"
        })),
        (status = 400, description = "Admin password missing", body = Object, example = json!({
            "data": "Admin password is required!"
        }))
    ),
    tag = "General"
)]
#[instrument(name = "install", skip_all)]
pub async fn install(
    store: web::Data<dyn DocumentStore>,
    body: web::Json<InstallReq>,
) -> Result<HttpResponse, ApiError> {
    let InstallReq { admin, setting } = body.into_inner();
    let mut admin = admin.unwrap_or_default();

    let hashed = match admin.get(PASSWORD).and_then(Value::as_str) {
        Some(plain) if !plain.is_empty() => hash_password(plain)?,
        _ => return Err(ApiError::BadRequest("Admin password is required!".to_string())),
    };

    admin.insert("id".to_string(), Uuid::new_v4().to_string().into());
    admin.insert(PASSWORD.to_string(), hashed.into());
    admin.insert("role".to_string(), Role::Admin.as_str().into());
    admin.insert("status".to_string(), true.into());

    let admin = store.insert(Resource::User.collection(), admin).await?;
    info!(email = ?admin.get("email"), "Admin account created");

    let mut setting = setting.unwrap_or_default();
    setting.insert("id".to_string(), Uuid::new_v4().to_string().into());
    store.insert(Resource::Setting.collection(), setting).await?;

    Ok(HttpResponse::Ok().json(json!({ "data": "Success" })))
}

/// Server and deployment version
#[utoipa::path(
    get,
    path = "/api/version",
    responses(
        (status = 200, description = "Versions", body = Object, example = json!({
            "data": { "version": "1.4.0", "server": "0.1.0" }
        }))
    ),
    tag = "General"
)]
pub async fn version(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "data": {
            "version": config.version,
            "server": env!("CARGO_PKG_VERSION"),
        }
    }))
}
