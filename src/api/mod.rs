mod handlers;
pub mod middleware;

pub use handlers::{Identity, UID_HEADER};
pub use middleware::SecurityConfig;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::services::FleetService;
use middleware::{auth_middleware, rate_limit_middleware};

/// Router with authentication and rate limiting disabled.
pub fn create_router(service: FleetService) -> Router {
    create_router_with_config(service, SecurityConfig::disabled())
}

pub fn create_router_with_config(service: FleetService, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Auth & directory
        .route("/auth/anonymous", post(handlers::sign_in_anonymously))
        .route("/me/starship", get(handlers::discover_starship))
        .route("/join", post(handlers::join_starship))
        // Starships
        .route("/starships", post(handlers::commission_starship))
        .route(
            "/starships/{id}",
            get(handlers::get_starship).patch(handlers::update_starship),
        )
        .route("/starships/{id}/hull-integrity", put(handlers::set_hull_integrity))
        .route("/starships/{id}/stream", get(handlers::stream_starship))
        // Modules
        .route(
            "/starships/{id}/modules",
            get(handlers::list_modules).post(handlers::add_module),
        )
        .route("/starships/{id}/modules/stream", get(handlers::stream_modules))
        .route(
            "/starships/{id}/modules/{module_id}",
            get(handlers::get_module)
                .patch(handlers::update_module)
                .delete(handlers::delete_module),
        )
        // Missions
        .route(
            "/starships/{id}/missions",
            get(handlers::list_missions).post(handlers::add_mission),
        )
        .route("/starships/{id}/missions/stream", get(handlers::stream_missions))
        .route(
            "/starships/{id}/missions/{mission_id}",
            get(handlers::get_mission)
                .patch(handlers::update_mission)
                .delete(handlers::delete_mission),
        )
        .route(
            "/starships/{id}/missions/{mission_id}/claim",
            post(handlers::claim_mission),
        )
        .route(
            "/starships/{id}/missions/{mission_id}/submit",
            post(handlers::submit_mission),
        )
        .route(
            "/starships/{id}/missions/{mission_id}/approve",
            post(handlers::approve_mission),
        )
        .route(
            "/starships/{id}/missions/{mission_id}/status",
            put(handlers::set_mission_status),
        )
        // Crew
        .route(
            "/starships/{id}/crew",
            get(handlers::list_crew).post(handlers::recruit_crew),
        )
        .route("/starships/{id}/crew/stream", get(handlers::stream_crew))
        .route("/starships/{id}/crew/presence", post(handlers::record_presence))
        .route(
            "/starships/{id}/crew/{crew_id}",
            get(handlers::get_crew_member).patch(handlers::update_crew_member),
        )
        .route(
            "/starships/{id}/crew/{crew_id}/registration-code",
            post(handlers::refresh_registration_code),
        )
        .layer(from_fn_with_state(security.clone(), auth_middleware));

    let api = match security.rate_limiter.clone() {
        Some(limiter) => api.layer(from_fn_with_state(limiter, rate_limit_middleware)),
        None => api,
    };

    Router::new()
        .nest(
            "/api/v1",
            api.route("/health", get(handlers::health)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(service)
}
