// =====================================================
// FILE: src/server/instance.rs - ACTIX-WEB SERVER INSTANCE
// =====================================================

use crate::core::config::AuthConfig;
use crate::core::constants::{APP_TITLE, VERSION};
use crate::core::prelude::*;
use crate::server::routes;
use crate::server::types::AppState;

use actix_web::middleware::{Condition, Logger};
use actix_web::{App, HttpServer};

/// Opens the stores, prints the banner and serves until shutdown.
pub async fn run(config: Config) -> Result<()> {
    let log_requests = config.logging.log_requests;
    let bind_addr = config.bind_address();
    let workers = config.server.workers;
    let shutdown_timeout = config.server.shutdown_timeout;

    let state = AppState::from_config(config).await?;
    log_banner(&state);

    let server = HttpServer::new({
        let state = state.clone();
        move || {
            let state = state.clone();
            App::new()
                // Logger nur wenn aktiviert (kein Typwechsel dank Condition)
                .wrap(Condition::new(log_requests, Logger::default()))
                .configure(|app_cfg| routes::configure(app_cfg, &state))
        }
    })
    .workers(workers)
    .shutdown_timeout(shutdown_timeout)
    .bind(&bind_addr)
    .map_err(|e| {
        log::error!("Cannot bind {}: {}", bind_addr, e);
        AppError::Io(e)
    })?;

    log::info!("Listening on {}", bind_addr);
    server.run().await?;
    log::info!("Server stopped");
    Ok(())
}

fn log_banner(state: &AppState) {
    let config = &state.config;
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "localhost",
        other => other,
    };
    let base_url = format!("http://{}:{}", host, config.server.port);

    log::info!("{} v{}", APP_TITLE, VERSION);
    log::info!("Scripts directory: {}", state.scripts.root().display());
    log::info!("Analytics file: {}", state.analytics.file_path().display());
    log::info!("Editor: {}/", base_url);
    log::info!("Analytics: {}/analytics", base_url);
    log::info!(
        "Script URL format: {}/scripts/<folder>/<name>{}",
        base_url,
        state.scripts.extension()
    );

    if let Some(notice) = credential_notice(config.is_first_run(), &config.auth) {
        log::warn!("{}", notice);
    }
}

/// Values are shown only on the run that created the config file.
fn credential_notice(first_run: bool, auth: &AuthConfig) -> Option<String> {
    if first_run {
        if let (Some(user), Some(pass)) =
            (auth.username.display_hint(), auth.password.display_hint())
        {
            return Some(format!(
                "Default login {} / {}, change it in the config file",
                user, pass
            ));
        }
    }
    (auth.username.is_plaintext() || auth.password.is_plaintext())
        .then(|| "Login credentials are stored in plaintext; see --hash-credential".to_string())
}
