//! Chocolate token service library
//!
//! This library exports the core modules used by the server binary and the
//! integration tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

// Re-export commonly used types for convenience
pub use config::AppSettings;
pub use error::AppError;
pub use models::runtime_config::AppState;
