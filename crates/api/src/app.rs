use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::ProgramService;
use shared::jwt::{JwtConfig, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{catalog, groups, health, programs};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub programs: ProgramService,
    /// Verification keys, parsed once at startup.
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(config: Config, programs: ProgramService) -> Result<Self, JwtError> {
        let jwt = if config.jwt.private_key.is_empty() {
            JwtConfig::rs256_verifier(&config.jwt.public_key, config.jwt.leeway_secs)?
        } else {
            JwtConfig::rs256(
                &config.jwt.private_key,
                &config.jwt.public_key,
                config.jwt.access_token_expiry_secs,
                config.jwt.leeway_secs,
            )?
        };
        Ok(Self {
            config: Arc::new(config),
            programs,
            jwt: Arc::new(jwt),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated through the UserAuth extractor in each handler.
    let api_routes = Router::new()
        .route(
            "/api/v1/programs",
            post(programs::create_program).get(programs::list_user_programs),
        )
        .route("/api/v1/programs/pending", get(programs::list_pending_programs))
        .route(
            "/api/v1/programs/:program_id",
            get(programs::get_program)
                .put(programs::update_program)
                .delete(programs::delete_program),
        )
        .route("/api/v1/programs/:program_id/move", post(programs::move_entry))
        .route("/api/v1/programs/:program_id/accept", put(programs::accept_program))
        .route("/api/v1/programs/:program_id/decline", put(programs::decline_program))
        .route("/api/v1/programs/:program_id/reinvite", post(programs::reinvite_member))
        .route("/api/v1/programs/:program_id/progress", get(programs::get_progress))
        .route("/api/v1/programs/:program_id/sessions", post(programs::record_session))
        .route("/api/v1/groups/:group_id/programs", get(groups::list_group_programs))
        .route("/api/v1/groups/:group_id/messages", get(groups::list_group_messages))
        .route("/api/v1/catalog/workouts", get(catalog::list_workouts))
        .route("/api/v1/catalog/geo-activities", get(catalog::list_geo_activities));

    let public_routes = Router::new()
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Bottom layers run first.
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
