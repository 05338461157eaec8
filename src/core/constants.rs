pub const APP_TITLE: &str = "SCRIPT SHELF SERVER";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_FILE_NAME: &str = "script_server.toml";
pub const CONFIG_ENV_VAR: &str = "SCRIPT_SERVER_CONFIG";

pub const SESSION_COOKIE: &str = "script_session";

// Analytics bounds
pub const MAX_UNIQUE_IPS: usize = 100;
pub const MAX_HISTORY: usize = 1000;
pub const TOP_SCRIPTS_LIMIT: usize = 10;
pub const RECENT_ACTIVITY_LIMIT: usize = 50;

pub const MAX_NAME_LENGTH: usize = 128;
pub const NEW_SCRIPT_TEMPLATE: &str = "-- New script\nprint(\"Hello from script server!\")\n";
