use axum::{http::StatusCode, Json};
use contracts::dashboards::d100_registration_summary::dto::DashboardStats;

use crate::dashboards::d100_registration_summary::service;

/// GET /api/students/stats
pub async fn get_stats() -> Result<Json<DashboardStats>, StatusCode> {
    match service::get_stats().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            tracing::error!("Failed to build dashboard stats: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
