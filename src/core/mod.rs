pub mod config;
pub mod constants;
pub mod credential;
pub mod error;
pub mod prelude;
