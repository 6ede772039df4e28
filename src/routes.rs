use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, users},
    state::AppState,
};

pub fn app_router(state: Arc<AppState>) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .unwrap(),
    );

    // credential-bearing endpoints are rate limited per client IP
    let public = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/refresh-access", post(users::refresh_access))
        .route_layer(GovernorLayer::new(governor_conf));

    let protected = Router::new()
        .route("/logout", post(users::logout))
        .route("/change-password", post(users::change_password))
        .route("/user-details", get(users::user_details))
        .route(
            "/update-account-details",
            patch(users::update_account_details),
        );

    let origins: Vec<HeaderValue> = state
        .cfg
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/api/v1/healthcheck", get(health::healthcheck))
        .nest("/api/v1/users", public.merge(protected))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
