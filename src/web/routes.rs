//! 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::web::handlers;
use crate::web::types::AppState;

/// 组装全部路由并挂载共享状态
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/translate", post(handlers::translate))
        .route("/config", get(handlers::show_config))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/cache/status", get(handlers::cache_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
