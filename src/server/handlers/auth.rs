// ===== src/server/handlers/auth.rs =====
use crate::server::handlers::pages::render_login;
use crate::server::types::{AppState, LoginForm};
use actix_web::{http::header, web, HttpResponse, Result as ActixResult};

// GET /login
pub async fn login_page() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_login(None)))
}

// POST /login
pub async fn login_handler(
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let auth = &state.config.auth;
    // both checks always run
    let valid = auth.username.verify(&form.username) & auth.password.verify(&form.password);

    if !valid {
        log::warn!("Failed login attempt for user '{}'", form.username);
        return Ok(HttpResponse::Unauthorized()
            .content_type("text/html; charset=utf-8")
            .body(render_login(Some("Invalid username or password"))));
    }

    log::info!("User '{}' logged in", form.username);
    let token = state.sessions.issue();
    Ok(HttpResponse::SeeOther()
        .cookie(state.sessions.login_cookie(token))
        .insert_header((header::LOCATION, "/"))
        .finish())
}

// GET /logout
pub async fn logout_handler(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::SeeOther()
        .cookie(state.sessions.logout_cookie())
        .insert_header((header::LOCATION, "/login"))
        .finish())
}
