// ===== src/server/handlers/analytics.rs =====
use crate::server::analytics::DASHBOARD_HTML;
use crate::server::types::{AppState, SuccessResponse};
use crate::server::utils::validation::script_identity;
use actix_web::{web, HttpResponse, Result as ActixResult};

// GET /api/analytics: overview JSON
pub async fn analytics_overview_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let overview = state.analytics.overview().await;
    Ok(HttpResponse::Ok().json(overview))
}

// GET /api/analytics/{folder}/{name}: per-script stats, zeroed when never loaded
pub async fn analytics_script_handler(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (folder, name) = path.into_inner();
    let stats = state
        .analytics
        .script_stats(&script_identity(&folder, &name))
        .await;
    Ok(HttpResponse::Ok().json(stats))
}

// POST /api/analytics/reset
pub async fn analytics_reset_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    state.analytics.reset().await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

// GET /analytics: embedded dashboard
pub async fn analytics_dashboard_handler(
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let overview = state.analytics.overview().await;
    let json_data = serde_json::to_string(&overview)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/"); // Prevent XSS in inline script
    let html = DASHBOARD_HTML.replace("__ANALYTICS_DATA__", &json_data);
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
