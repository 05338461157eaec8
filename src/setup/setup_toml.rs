// =====================================================
// FILE: src/setup/setup_toml.rs - FIRST-RUN DEFAULTS
// =====================================================

use crate::core::constants::{CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use crate::core::prelude::*;
use tokio::fs;

const DEFAULT_CONFIG: &str = r#"[server]
host = "0.0.0.0"
# Overridden by the PORT environment variable
port = 5000
workers = 2
shutdown_timeout = 5

[auth]
# CHANGE THESE! Either plaintext or a "$hmac-sha256$..." hash.
# SCRIPT_SERVER_USERNAME / SCRIPT_SERVER_PASSWORD override both.
username = "script"
password = "scipt"
# Left empty: a random secret is generated and written back on first start
session_secret = ""
session_ttl_hours = 12

[storage]
scripts_dir = "lua_scripts"
analytics_file = "analytics.json"
script_extension = ".lua"

[logging]
# RUST_LOG takes precedence
log_level = "info"
log_requests = true
"#;

/// Writes the default config into the working directory unless one exists.
pub async fn ensure_config_exists() -> Result<PathBuf> {
    ensure_config_in(Path::new(".")).await
}

pub async fn ensure_config_in(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir).await?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        fs::write(&config_path, DEFAULT_CONFIG).await?;
    }

    Ok(config_path)
}

pub fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        if !explicit.is_empty() {
            paths.push(PathBuf::from(explicit));
        }
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(base_dir) = exe_path.parent() {
            paths.push(base_dir.join(CONFIG_FILE_NAME));
        }
    }
    paths
}
