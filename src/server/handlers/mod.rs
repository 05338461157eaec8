// ===== src/server/handlers/mod.rs =====
pub mod analytics;
pub mod auth;
pub mod pages;
pub mod public;
pub mod scripts;

// Re-exports für einfache Verwendung
pub use analytics::*;
pub use auth::*;
pub use pages::*;
pub use public::*;
pub use scripts::*;
