use thiserror::Error;

/// Errors produced by the menu pipeline.
///
/// `fetch_and_parse` never lets any of these escape — every recoverable
/// variant is swallowed and converted to `None` before it reaches a caller.
/// Only `UnknownHall` and `InvalidDate` are meant to surface past the
/// service boundary.
#[derive(Error, Debug)]
pub enum MenuError {
    #[cfg(feature = "db")]
    #[error("database error: {0}")]
    Database(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown hall: {0}")]
    UnknownHall(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("snapshot store error: {0}")]
    Store(String),

    #[error("coalescer timed out waiting for in-flight fetch")]
    Timeout,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MenuError>;
