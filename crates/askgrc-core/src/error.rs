use thiserror::Error;

/// Failures that reach the caller of the engine.
///
/// Everything else (a retrieval source erroring, a generation provider
/// failing, the query log being unavailable) is absorbed into a degraded
/// answer and never surfaces as an `Err`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
