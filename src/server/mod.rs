// =====================================================
// FILE: src/server/mod.rs - SCRIPT SHELF SERVER MODULE
// =====================================================

pub mod analytics;
pub mod handlers;
pub mod instance;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

pub use analytics::AnalyticsStore;
pub use instance::run;
pub use session::SessionManager;
pub use store::ScriptStore;
