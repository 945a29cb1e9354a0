use thiserror::Error;

use crate::gateway::GatewayError;

/// Centralized error type for the store-and-deliver pipelines.
///
/// Recoverable failures funnel into this enum so callers can propagate with
/// `?` and log uniformly at the dispatch boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Outbound messaging errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
