use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AdminGate;
use crate::config::Config;
use crate::db::Store;

mod accounts;
mod admin;
mod error;
pub mod types;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub gate: AdminGate,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn gate(&self) -> &AdminGate {
        &self.gate
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let gate = AdminGate::new(config.admin.password_digest.clone());

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        store,
        gate,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/delete_license", post(admin::delete_license))
        .route("/delete_user", post(admin::delete_user))
        .route("/change_password", post(admin::change_password))
        .route("/change_rank", post(admin::change_rank))
        .route("/licenses", get(admin::list_licenses))
        .route("/users", get(admin::list_users))
        .route("/ban_user", get(admin::ban_user))
        .route("/unban_user", get(admin::unban_user))
        .route("/generate_license", post(admin::generate_license))
        .route("/check_license", get(admin::check_license))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
