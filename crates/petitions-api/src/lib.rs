use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};
use serde_json::{Value, json};

use petitions_db::Database;

pub mod auth;
pub mod error;
pub mod extract;
pub mod images;
pub mod passwords;
pub mod petitions;
pub mod support_tiers;
pub mod supporters;
pub mod users;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Directory user and petition images are written to.
    pub image_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// All API routes under `/api/v1`, plus `/health`.
pub fn create_router(state: AppState) -> Router {
    let users = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/{id}", get(users::view).patch(users::update))
        .route(
            "/users/{id}/image",
            get(images::get_user_image)
                .put(images::set_user_image)
                .delete(images::delete_user_image),
        );

    let petitions = Router::new()
        .route("/petitions", get(petitions::list).post(petitions::create))
        .route("/petitions/categories", get(petitions::categories))
        .route(
            "/petitions/{id}",
            get(petitions::get).patch(petitions::edit).delete(petitions::delete),
        )
        .route(
            "/petitions/{id}/image",
            get(images::get_petition_image).put(images::set_petition_image),
        )
        .route("/petitions/{id}/supportTiers", put(support_tiers::add))
        .route(
            "/petitions/{id}/supportTiers/{tier_id}",
            patch(support_tiers::edit).delete(support_tiers::delete),
        )
        .route(
            "/petitions/{id}/supporters",
            get(supporters::list).post(supporters::add),
        );

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", users.merge(petitions))
        .layer(body_limit)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
