// =====================================================
// FILE: src/server/routes.rs - ROUTE TABLE
// =====================================================

use crate::server::handlers;
use crate::server::middleware::RequireSession;
use crate::server::types::AppState;
use actix_web::web;
use std::sync::Arc;

/// Registers state, public routes and the session-gated scope.
/// Public routes come first; the empty scope matches everything that is left.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        // Öffentlich: Loader holen Skripte ohne Login
        .route(
            "/scripts/{folder}/{name}",
            web::get().to(handlers::serve_script),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(handlers::login_page))
                .route(web::post().to(handlers::login_handler)),
        )
        .route("/logout", web::get().to(handlers::logout_handler))
        .service(
            web::scope("")
                .wrap(RequireSession::new(Arc::clone(&state.sessions)))
                .route("/", web::get().to(handlers::editor_page))
                .route(
                    "/analytics",
                    web::get().to(handlers::analytics_dashboard_handler),
                )
                .service(
                    web::scope("/api")
                        .route("/folders", web::get().to(handlers::list_folders_handler))
                        .route(
                            "/scripts/{folder}",
                            web::get().to(handlers::list_scripts_handler),
                        )
                        .route(
                            "/save/{folder}/{name}",
                            web::post().to(handlers::save_script_handler),
                        )
                        .route(
                            "/delete/{folder}/{name}",
                            web::delete().to(handlers::delete_script_handler),
                        )
                        .route(
                            "/create-folder",
                            web::post().to(handlers::create_folder_handler),
                        )
                        .route(
                            "/create-script/{folder}",
                            web::post().to(handlers::create_script_handler),
                        )
                        .route(
                            "/analytics",
                            web::get().to(handlers::analytics_overview_handler),
                        )
                        .route(
                            "/analytics/reset",
                            web::post().to(handlers::analytics_reset_handler),
                        )
                        .route(
                            "/analytics/{folder}/{name}",
                            web::get().to(handlers::analytics_script_handler),
                        ),
                ),
        );
}
