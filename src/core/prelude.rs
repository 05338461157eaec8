// src/core/prelude.rs

// Core essentials
pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};

// Standard library essentials
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use std::time::Duration;
