use crate::{
    api::{general, resource},
    auth::{handlers, middleware::auth_middleware},
    error::ApiError,
    model::Resource,
    state::AppState,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    middleware::{Condition, from_fn},
    web,
};
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 50 * 1024 * 1024;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let config = &state.config;

    cfg.app_data(web::Data::from(state.store.clone()))
        .app_data(web::Data::new(config.clone()))
        .app_data(web::Data::new(state.clock))
        .app_data(json_config());

    let login_limited = config.rate_login_per_min > 0;
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limited = config.rate_protected_per_min > 0;
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::resource("/api/login")
            .wrap(Condition::new(login_limited, login_limiter.clone()))
            .route(web::post().to(handlers::login)),
    )
    .service(
        web::resource("/api/install")
            .wrap(Condition::new(login_limited, login_limiter))
            .route(web::post().to(general::install)),
    )
    .service(web::resource("/api/refresh").route(web::post().to(handlers::refresh_token)))
    .service(web::resource("/api/initial").route(web::get().to(general::initial)))
    .service(web::resource("/api/version").route(web::get().to(general::version)));

    // Protected entity scopes: /api/<entity> and /api/<entity>/{id}
    for entity in Resource::iter() {
        let list = match entity {
            Resource::Setting => web::get().to(resource::setting),
            _ => web::get().to(resource::list),
        };

        cfg.service(
            web::scope(&entity.path())
                .app_data(web::Data::new(entity))
                .wrap(from_fn(auth_middleware))
                .wrap(Condition::new(protected_limited, protected_limiter.clone()))
                .service(
                    web::resource("")
                        .route(list)
                        .route(web::post().to(resource::create)),
                )
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(resource::get))
                        .route(web::put().to(resource::update))
                        .route(web::delete().to(resource::delete)),
                ),
        );
    }
}
