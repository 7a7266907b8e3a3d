use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::store::Document;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@company.com")]
    pub email: Option<String>,
    #[schema(example = "secret")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    pub token: String,
    pub id: String,
    /// Profile fields are echoed as stored.
    #[schema(value_type = Option<String>, example = "admin@company.com")]
    pub email: Value,
    #[schema(value_type = Option<String>)]
    pub name: Value,
    #[schema(value_type = Option<String>, example = "admin")]
    pub role: Value,
}

/// First-run payload: the admin account and the company settings.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InstallReq {
    #[schema(value_type = Object, example = json!({
        "email": "admin@company.com",
        "name": "Admin",
        "password": "secret"
    }))]
    pub admin: Option<Document>,
    #[schema(value_type = Object, example = json!({
        "name": "Company Name",
        "country": "MNG",
        "leaveLimit": 14
    }))]
    pub setting: Option<Document>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Zero-based page as requested, null when absent.
    pub page: Option<u64>,
    pub pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Document>,
    pub pagination: Pagination,
    /// Applied filter and sort.
    #[schema(value_type = Object)]
    pub query: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResult {
    pub acknowledged: bool,
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// External id of the user.
    pub id: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}
