//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Cursor drift, an unresolved
//! session and competing gate rules are not errors: the core clamps, waits,
//! or lets the highest-priority rule win.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// The display scheduler task is gone or its timings are unusable.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("UI error: {0}")]
    Ui(String),
}
