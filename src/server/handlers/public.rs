// ===== src/server/handlers/public.rs =====
use crate::core::error::AppError;
use crate::server::types::AppState;
use crate::server::utils::validation::{has_script_extension, script_identity};
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use std::net::SocketAddr;

/// GET /scripts/{folder}/{name}: raw script for loaders, no login.
/// Analytics failures are logged; the script is served regardless.
pub async fn serve_script(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (folder, name) = path.into_inner();

    if !has_script_extension(&name, state.scripts.extension()) {
        return Err(AppError::Forbidden(format!(
            "Only {} files are served",
            state.scripts.extension()
        ))
        .into());
    }

    let content = state
        .scripts
        .read_script(&folder, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{}/{}", folder, name)))?;

    let identity = script_identity(&folder, &name);
    let ip = client_ip(&req);
    if let Err(e) = state.analytics.record_load(&identity, ip.as_deref()).await {
        log::error!("Failed to record load of {}: {}", identity, e);
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(content))
}

/// Requester address without port. Honors `Forwarded` / `X-Forwarded-For`.
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let connection_info = req.connection_info();
    let raw = connection_info.realip_remote_addr()?;
    let ip = match raw.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => raw.trim_start_matches('[').trim_end_matches(']').to_string(),
    };
    (!ip.is_empty()).then_some(ip)
}
