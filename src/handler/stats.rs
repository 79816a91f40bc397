use std::sync::Arc;

use axum::{extract::Query, middleware, response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    dtos::StatsQueryParams,
    error::HttpError,
    middleware::role_check,
    models::usermodel::UserRole,
    AppState,
};

pub fn stats_handler() -> Router {
    // Read-only reporting for the staff who run the queue.
    Router::new().route(
        "/",
        get(get_stats).layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
        })),
    )
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<StatsQueryParams>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .stats_service
        .collect(params.period.unwrap_or_default())
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": stats
    })))
}
