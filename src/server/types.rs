// src/server/types.rs
use crate::core::config::Config;
use crate::server::analytics::AnalyticsStore;
use crate::server::session::SessionManager;
use crate::server::store::ScriptStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub scripts: Arc<ScriptStore>,
    pub analytics: Arc<AnalyticsStore>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Opens the script root and the analytics document named in the config.
    pub async fn from_config(config: Config) -> crate::core::error::Result<Self> {
        let scripts =
            ScriptStore::open(&config.storage.scripts_dir, &config.storage.script_extension)
                .await?;
        let analytics = AnalyticsStore::open(&config.storage.analytics_file).await?;
        let sessions = SessionManager::from_config(&config.auth);

        Ok(Self {
            config: Arc::new(config),
            scripts: Arc::new(scripts),
            analytics: Arc::new(analytics),
            sessions: Arc::new(sessions),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveScriptRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
