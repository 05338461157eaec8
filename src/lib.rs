// Module definitions
pub mod core;
pub mod server;
pub mod setup;

// Essential re-exports
pub use core::config::Config;
pub use core::error::{AppError, Result};
pub use server::types::AppState;
