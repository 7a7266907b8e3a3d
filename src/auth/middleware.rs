use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::{Resource, user::without_password};
use crate::store::{DocumentStore, Filter};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

const TOKEN_REQUIRED: &str = "A token is required for authentication";

/// Splits `<scheme> <token>`. A missing header or token is Forbidden, a
/// foreign scheme Unauthorized.
pub fn extract_token<'a>(header: Option<&'a str>, scheme: &str) -> Result<&'a str, ApiError> {
    let header = header.ok_or_else(|| ApiError::Forbidden(TOKEN_REQUIRED.to_string()))?;

    let mut parts = header.split_whitespace();
    let given_scheme = parts.next().unwrap_or_default();
    let token = parts
        .next()
        .ok_or_else(|| ApiError::Forbidden(TOKEN_REQUIRED.to_string()))?;

    if !given_scheme.eq_ignore_ascii_case(scheme) {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Ok(token)
}

async fn authenticate(req: &ServiceRequest) -> Result<AuthUser, ApiError> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ApiError::Internal("App config missing".to_string()))?;
    let store = req
        .app_data::<Data<dyn DocumentStore>>()
        .ok_or_else(|| ApiError::Internal("Document store missing".to_string()))?;

    let header = match req.headers().get("Authorization") {
        Some(h) => Some(
            h.to_str()
                .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?,
        ),
        None => None,
    };
    let token = extract_token(header, &config.auth_scheme)?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected token");
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    let user = store
        .find_one(Resource::User.collection(), &Filter::eq("id", claims.id.clone()))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(AuthUser {
        claims,
        profile: without_password(user),
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    match authenticate(&req).await {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => Ok(req.into_response(e.error_response())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn token_follows_the_configured_scheme() {
        assert_eq!(extract_token(Some("Token abc.def"), "Token").unwrap(), "abc.def");
        assert_eq!(extract_token(Some("token   abc"), "Token").unwrap(), "abc");
        assert_eq!(extract_token(Some("Bearer abc"), "Bearer").unwrap(), "abc");
    }

    #[test]
    fn missing_pieces_are_forbidden() {
        let missing = extract_token(None, "Token").unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::FORBIDDEN);

        let bare = extract_token(Some("Token"), "Token").unwrap_err();
        assert_eq!(bare.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn foreign_scheme_is_unauthorized() {
        let err = extract_token(Some("Bearer abc"), "Token").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
