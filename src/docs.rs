use crate::api::dashboard::{ExpenseDashboard, ProjectDashboard};
use crate::model::Resource;
use crate::models::{DeleteResult, InstallReq, ListResponse, LoginData, LoginReqDto, Pagination};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the `Authorization: Token <jwt>` header scheme.
struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <access token>",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Panel API",
        version = "1.0.0",
        description = r#"
## HR admin panel

Backend of the HR admin panel: attendance, leave, projects, tasks, expenses,
departments, designations, users, notifications, announcements and the
company settings record.

### Lists
Every `GET /api/<entity>` accepts the same query protocol: any non-reserved
parameter filters by equality, `keyword` searches the title or name,
`time=day|week|month` restricts to the current period, and
`sort`, `limit` and zero-based `page` paginate.

### Security
Entity routes require `Authorization: Token <jwt>` obtained from `/api/login`.

### Response format
Every body is `{ "data": ... }`; lists add `pagination` and the applied `query`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,

        crate::api::general::initial,
        crate::api::general::install,
        crate::api::general::version,

        crate::api::resource::list,
        crate::api::resource::setting,
        crate::api::resource::get,
        crate::api::resource::create,
        crate::api::resource::update,
        crate::api::resource::delete
    ),
    components(
        schemas(
            Resource,
            LoginReqDto,
            LoginData,
            InstallReq,
            Pagination,
            ListResponse,
            DeleteResult,
            ProjectDashboard,
            ExpenseDashboard
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "Auth", description = "Sign in"),
        (name = "General", description = "Installation and version"),
        (name = "Resources", description = "Generic entity CRUD and list protocol"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_entity_routes_and_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/{entity}"));
        assert!(doc.paths.paths.contains_key("/api/login"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
