//! Error types for visibility-engine boundary parsing.
//!
//! Evaluation itself never fails; these errors only arise where text enters
//! the system (reference instant, timezone name, content documents).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
