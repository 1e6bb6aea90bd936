use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod exercises;
mod observability;
mod sessions;
mod system;
mod types;
mod users;
mod validation;
mod webhooks;
mod workouts;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password/forgot", post(auth::forgot_password))
        .route("/auth/password/reset", post(auth::reset_password))
        .route("/webhooks/stripe", post(webhooks::stripe_webhook));

    let api_router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api/v1", api_router)
        .route("/", get(system::welcome))
        .route("/health", get(system::health))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/password", put(auth::change_password))
        .route("/users/me", get(users::get_me))
        .route("/users/me", put(users::update_me))
        .route("/users/me/subscription", get(users::get_my_subscription))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/active", put(users::set_user_active))
        .route("/exercises/categories", get(exercises::list_categories))
        .route(
            "/exercises/muscle-groups",
            get(exercises::list_muscle_groups),
        )
        .route("/exercises/equipment", get(exercises::list_equipment))
        .route("/exercises", get(exercises::list_exercises))
        .route("/exercises", post(exercises::create_exercise))
        .route("/exercises/{id}", get(exercises::get_exercise))
        .route("/exercises/{id}", put(exercises::update_exercise))
        .route("/exercises/{id}", delete(exercises::delete_exercise))
        .route("/exercises/{id}/images", get(exercises::list_images))
        .route(
            "/exercises/{id}/images",
            post(exercises::presign_image_upload),
        )
        .route("/exercises/{id}/images", delete(exercises::delete_image))
        .route("/workouts", get(workouts::list_workouts))
        .route("/workouts", post(workouts::create_workout))
        .route("/workouts/{id}", get(workouts::get_workout))
        .route("/workouts/{id}", delete(workouts::delete_workout))
        .route("/plans", get(workouts::list_plans))
        .route("/plans", post(workouts::create_plan))
        .route("/plans/{id}", get(workouts::get_plan))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/start", post(sessions::start_session))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}/complete", post(sessions::complete_session))
        .route("/sessions/{id}/abandon", post(sessions::abandon_session))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
