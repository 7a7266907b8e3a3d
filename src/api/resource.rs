//! Generic list/get/create/update/delete handlers shared by every entity
//! scope. The entity comes from the scope's `Data<Resource>`.

use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::api::{dashboard, hooks};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::model::Resource;
use crate::model::user::without_password;
use crate::models::{DeleteResult, ListResponse, Pagination};
use crate::query::{Clock, ListQuery};
use crate::store::{CREATED_AT, Document, DocumentStore, Filter, INTERNAL_ID, StoreError};

fn query_params(req: &HttpRequest) -> Result<BTreeMap<String, String>, ApiError> {
    web::Query::<BTreeMap<String, String>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Attaches referenced records to each row. A referent that no longer
/// exists leaves the join field out.
async fn attach_joins(
    store: &dyn DocumentStore,
    resource: Resource,
    rows: &mut [Document],
) -> Result<(), StoreError> {
    let joins = resource.joins();
    if joins.is_empty() {
        return Ok(());
    }

    for row in rows.iter_mut() {
        for join in joins {
            let Some(key) = row.get(join.key).and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            let found = store
                .find_one(join.target.collection(), &Filter::eq("id", key))
                .await?;
            if let Some(found) = found {
                let found = match join.target {
                    Resource::User => without_password(found),
                    _ => found,
                };
                row.insert(join.attach_as.to_string(), Value::Object(found));
            }
        }
    }
    Ok(())
}

/// List entities
#[utoipa::path(
    get,
    path = "/api/{entity}",
    params(
        ("entity" = Resource, Path, description = "Entity collection"),
        ("sort", Query, description = "`field` or `field,desc`"),
        ("limit", Query, description = "Page size, 0 for all"),
        ("page", Query, description = "Zero-based page"),
        ("keyword", Query, description = "Case-insensitive search on the title or name"),
        ("time", Query, description = "day, week or month window"),
        ("today", Query, description = "Attendance only, same as time=day"),
        ("active", Query, description = "Announcements only, currently running"),
        ("dashboard", Query, description = "Project and expense only, monthly summary")
    ),
    responses(
        (status = 200, description = "Matching rows", body = ListResponse),
        (status = 400, description = "Malformed filter", body = Object, example = json!({
            "data": "Invalid filter field: a.b"
        })),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Token missing")
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
#[instrument(name = "resource_list", skip_all, fields(entity = %resource.get_ref()))]
pub async fn list(
    req: HttpRequest,
    resource: web::Data<Resource>,
    store: web::Data<dyn DocumentStore>,
    clock: web::Data<Clock>,
) -> Result<HttpResponse, ApiError> {
    let resource = *resource.get_ref();
    let collection = resource.collection();
    let now = clock.now();
    let query = ListQuery::build(resource, &query_params(&req)?, &now)?;

    debug!(filter = %query.applied(), "Running list query");

    let mut rows = store.find(collection, &query.filter, &query.options).await?;

    if query.dashboard {
        if let Some(summary) = dashboard::summarize(resource, &rows, &now) {
            return Ok(HttpResponse::Ok().json(json!({ "data": summary })));
        }
    }

    let total = store.count(collection, &query.filter).await?;
    attach_joins(store.get_ref(), resource, &mut rows).await?;

    let data = rows
        .into_iter()
        .map(|row| hooks::present(resource, row))
        .collect();

    Ok(HttpResponse::Ok().json(ListResponse {
        data,
        pagination: Pagination {
            page: query.page,
            pages: query.pages(total),
        },
        query: query.applied(),
    }))
}

/// Settings document
#[utoipa::path(
    get,
    path = "/api/setting",
    responses(
        (status = 200, description = "The settings record", body = Object, example = json!({
            "data": { "id": "2f1c...", "companyName": "Acme LLC", "leaveLimit": 14 }
        })),
        (status = 404, description = "Nothing installed yet", body = Object, example = json!({
            "data": "Data not found!"
        }))
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
pub async fn setting(store: web::Data<dyn DocumentStore>) -> Result<HttpResponse, ApiError> {
    let found = store
        .find_one(Resource::Setting.collection(), &Filter::new())
        .await?
        .ok_or_else(ApiError::data_not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "data": found })))
}

/// Get one entity
#[utoipa::path(
    get,
    path = "/api/{entity}/{id}",
    params(
        ("entity" = Resource, Path, description = "Entity collection"),
        ("id", Path, description = "Internal `_id`")
    ),
    responses(
        (status = 200, description = "Found", body = Object),
        (status = 404, description = "Unknown id", body = Object, example = json!({
            "data": "Data not found!"
        }))
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
pub async fn get(
    resource: web::Data<Resource>,
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let resource = *resource.get_ref();
    let found = store
        .find_by_id(resource.collection(), &path)
        .await?
        .ok_or_else(ApiError::data_not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "data": hooks::present(resource, found) })))
}

/// Create an entity
#[utoipa::path(
    post,
    path = "/api/{entity}",
    params(("entity" = Resource, Path, description = "Entity collection")),
    request_body(content = Object, description = "Entity fields"),
    responses(
        (status = 200, description = "The stored document", body = Object),
        (status = 400, description = "Body is not a JSON object")
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
#[instrument(name = "resource_create", skip_all, fields(entity = %resource.get_ref(), actor = %auth.id()))]
pub async fn create(
    resource: web::Data<Resource>,
    store: web::Data<dyn DocumentStore>,
    clock: web::Data<Clock>,
    auth: AuthUser,
    body: web::Json<Document>,
) -> Result<HttpResponse, ApiError> {
    let resource = *resource.get_ref();
    let mut body = body.into_inner();
    body.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    hooks::before_create(resource, &mut body, &auth)?;

    let created = store.insert(resource.collection(), body).await?;

    if let Some(notice) = hooks::notification_for(resource, &created, &auth, &clock.now()) {
        store
            .insert(Resource::Notification.collection(), notice.into_document())
            .await?;
    }

    info!(id = ?created.get(INTERNAL_ID), "Created");
    Ok(HttpResponse::Ok().json(json!({ "data": hooks::present(resource, created) })))
}

/// Update an entity
///
/// Responds with the document as it was before the update.
#[utoipa::path(
    put,
    path = "/api/{entity}/{id}",
    params(
        ("entity" = Resource, Path, description = "Entity collection"),
        ("id", Path, description = "Internal `_id`")
    ),
    request_body(content = Object, description = "Fields to overwrite"),
    responses(
        (status = 200, description = "Previous state, null when the id is unknown", body = Object)
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
#[instrument(name = "resource_update", skip_all, fields(entity = %resource.get_ref(), id = %path.as_str()))]
pub async fn update(
    resource: web::Data<Resource>,
    store: web::Data<dyn DocumentStore>,
    clock: web::Data<Clock>,
    path: web::Path<String>,
    body: web::Json<Document>,
) -> Result<HttpResponse, ApiError> {
    let resource = *resource.get_ref();
    let mut patch = body.into_inner();
    for key in ["id", INTERNAL_ID, CREATED_AT] {
        patch.remove(key);
    }
    hooks::before_update(resource, &mut patch, &clock.now())?;

    let before = store
        .update_by_id(resource.collection(), &path, patch)
        .await?
        .map(|doc| hooks::present(resource, doc));

    if before.is_none() {
        debug!("No document matched");
    }

    Ok(HttpResponse::Ok().json(json!({ "data": before })))
}

/// Delete entities
#[utoipa::path(
    delete,
    path = "/api/{entity}/{id}",
    params(
        ("entity" = Resource, Path, description = "Entity collection"),
        ("id", Path, description = "Comma-separated internal ids")
    ),
    responses(
        (status = 200, description = "Deletion result", body = Object, example = json!({
            "data": { "acknowledged": true, "deletedCount": 2 }
        }))
    ),
    tag = "Resources",
    security(("api_key" = []))
)]
#[instrument(name = "resource_delete", skip_all, fields(entity = %resource.get_ref()))]
pub async fn delete(
    resource: web::Data<Resource>,
    store: web::Data<dyn DocumentStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let ids: Vec<String> = path
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let deleted = store.delete_many(resource.collection(), &ids).await?;
    info!(requested = ids.len(), deleted, "Deleted");

    Ok(HttpResponse::Ok().json(json!({
        "data": DeleteResult {
            acknowledged: true,
            deleted_count: deleted,
        }
    })))
}
