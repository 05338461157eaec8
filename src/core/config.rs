// src/core/config.rs
use crate::core::credential::{Credential, CredentialOrigin};
use crate::core::prelude::*;
use base64::Engine;
use serde::Deserialize;

// TOML Configuration Structure
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: Option<ServerConfigToml>,
    #[serde(default)]
    auth: Option<AuthConfigToml>,
    #[serde(default)]
    storage: Option<StorageConfigToml>,
    #[serde(default)]
    logging: Option<LoggingConfigToml>,
}

#[derive(Debug, Deserialize, Clone)]
struct ServerConfigToml {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_workers")]
    workers: usize,
    #[serde(default = "default_shutdown_timeout")]
    shutdown_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
struct AuthConfigToml {
    #[serde(default = "default_username")]
    username: String,
    #[serde(default = "default_password")]
    password: String,
    #[serde(default)]
    session_secret: String,
    #[serde(default = "default_session_ttl")]
    session_ttl_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
struct StorageConfigToml {
    #[serde(default = "default_scripts_dir")]
    scripts_dir: String,
    #[serde(default = "default_analytics_file")]
    analytics_file: String,
    #[serde(default = "default_script_extension")]
    script_extension: String,
}

#[derive(Debug, Deserialize, Clone)]
struct LoggingConfigToml {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_log_requests")]
    log_requests: bool,
}

// Server Defaults
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}
fn default_workers() -> usize {
    2
}
fn default_shutdown_timeout() -> u64 {
    5
}

// Auth Defaults
fn default_username() -> String {
    "script".into()
}
fn default_password() -> String {
    "scipt".into()
}
fn default_session_ttl() -> u64 {
    12
}

// Storage Defaults
fn default_scripts_dir() -> String {
    "lua_scripts".into()
}
fn default_analytics_file() -> String {
    "analytics.json".into()
}
fn default_script_extension() -> String {
    ".lua".into()
}

// Logging Defaults
fn default_log_level() -> String {
    "info".into()
}
fn default_log_requests() -> bool {
    true
}

// Main Configuration Structures
#[derive(Clone, Debug)]
pub struct Config {
    config_path: Option<PathBuf>,
    first_run: bool,
    pub debug_info: Option<String>,
    /// Problems found while loading, logged once the logger is up.
    pub warnings: Vec<String>,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub shutdown_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub username: Credential,
    pub password: Credential,
    pub session_secret: String,
    pub session_ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub scripts_dir: PathBuf,
    pub analytics_file: PathBuf,
    pub script_extension: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: Credential::plaintext(&default_username(), CredentialOrigin::ConfigFile),
            password: Credential::plaintext(&default_password(), CredentialOrigin::ConfigFile),
            session_secret: String::new(),
            session_ttl: Duration::from_secs(default_session_ttl() * 3600),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from(default_scripts_dir()),
            analytics_file: PathBuf::from(default_analytics_file()),
            script_extension: default_script_extension(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_requests: default_log_requests(),
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        let (path, created) = match crate::setup::setup_toml::get_config_paths()
            .into_iter()
            .find(|p| p.exists())
        {
            Some(path) => (path, false),
            None => (crate::setup::setup_toml::ensure_config_exists().await?, true),
        };

        let mut config = Self::load_from(&path, |key| std::env::var(key).ok()).await?;
        if created {
            config.first_run = true;
            config.debug_info = Some(format!("New config: {}", path.display()));
        }
        Ok(config)
    }

    /// Reads `path`, applies overrides from `lookup` and fills in a missing
    /// session secret. Only the secret is ever written back to the file.
    pub async fn load_from<P: AsRef<Path>>(
        path: P,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::from_file(&path).await?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        config.ensure_session_secret().await?;
        Ok(config)
    }

    /// A failed write-back is only a warning: the server still runs, sessions
    /// just do not survive a restart.
    async fn ensure_session_secret(&mut self) -> Result<()> {
        if !self.auth.session_secret.is_empty() {
            return Ok(());
        }
        let secret = generate_secret()?;
        if let Err(e) = self.persist_session_secret(&secret).await {
            self.warnings
                .push(format!("Could not persist generated session secret: {}", e));
        }
        self.auth.session_secret = secret;
        Ok(())
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| AppError::Config(format!("TOML: {}", e)))?;

        let server = file
            .server
            .map_or_else(ServerConfig::default, |s| ServerConfig {
                host: s.host,
                port: s.port,
                workers: s.workers.max(1),
                shutdown_timeout: s.shutdown_timeout,
            });

        let auth = match file.auth {
            Some(a) => AuthConfig {
                username: Credential::parse(
                    "auth.username",
                    &a.username,
                    CredentialOrigin::ConfigFile,
                )?,
                password: Credential::parse(
                    "auth.password",
                    &a.password,
                    CredentialOrigin::ConfigFile,
                )?,
                session_secret: a.session_secret,
                session_ttl: Duration::from_secs(
                    Self::clamp(a.session_ttl_hours, 1, 24 * 30, 12) * 3600,
                ),
            },
            None => AuthConfig::default(),
        };

        let storage = file
            .storage
            .map_or_else(StorageConfig::default, |s| StorageConfig {
                scripts_dir: PathBuf::from(s.scripts_dir),
                analytics_file: PathBuf::from(s.analytics_file),
                script_extension: s.script_extension,
            });

        let logging = file
            .logging
            .map_or_else(LoggingConfig::default, |l| LoggingConfig {
                log_level: l.log_level,
                log_requests: l.log_requests,
            });

        Ok(Self {
            config_path: None,
            first_run: false,
            debug_info: None,
            warnings: Vec::new(),
            server,
            auth,
            storage,
            logging,
        })
    }

    /// Environment overrides, held in memory only. Empty variables count as unset.
    /// `lookup` is `std::env::var` outside of tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        for (key, target) in [
            ("SCRIPT_SERVER_USERNAME", &mut self.auth.username),
            ("SCRIPT_SERVER_PASSWORD", &mut self.auth.password),
        ] {
            if let Some(value) = lookup(key) {
                *target = Credential::parse(key, &value, CredentialOrigin::Environment)?;
            }
        }
        if let Some(secret) = lookup("SCRIPT_SERVER_SECRET") {
            self.auth.session_secret = secret;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let ext = &self.storage.script_extension;
        if ext.len() < 2 || !ext.starts_with('.') || ext[1..].contains(['.', '/', '\\']) {
            return Err(AppError::Config(format!(
                "storage.script_extension must look like \".lua\", got {:?}",
                ext
            )));
        }
        Ok(())
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// True when `load` had to create the config file.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Edits `auth.session_secret` in place; comments and all other keys are
    /// left exactly as they are on disk.
    async fn persist_session_secret(&self, secret: &str) -> Result<()> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };

        let content = tokio::fs::read_to_string(path).await?;
        let mut doc = content
            .parse::<toml_edit::Document>()
            .map_err(|e| AppError::Config(format!("TOML: {}", e)))?;

        if !doc.get("auth").is_some_and(|item| item.is_table_like()) {
            doc["auth"] = toml_edit::table();
        }
        doc["auth"]["session_secret"] = toml_edit::value(secret);

        tokio::fs::write(path, doc.to_string())
            .await
            .map_err(AppError::Io)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn clamp(value: u64, min: u64, max: u64, default: u64) -> u64 {
        if value < min || value > max {
            default
        } else {
            value
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            first_run: false,
            debug_info: None,
            warnings: Vec::new(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn generate_secret() -> Result<String> {
    use ring::rand::SecureRandom;
    let mut bytes = [0u8; 32];
    ring::rand::SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Config("System RNG unavailable".to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
