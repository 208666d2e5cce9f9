//! Error types.
//!
//! - `PipelineError` is the typed, recoverable failure of one pipeline stage.
//!   The session keeps it around and renders it inline.
//! - `AppError` is the process-level error of the `sd` binary (message + exit code).

use thiserror::Error;

/// Exit code for invalid usage or input.
pub const EXIT_INVALID_INPUT: u8 = 2;
/// Exit code for data, network, terminal and filesystem failures.
pub const EXIT_RUNTIME: u8 = 4;

/// Failure of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Bad ticker, date range or window, detected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The market data source was unreachable, failed, or returned nothing usable.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Too few rows or columns to compute a statistic.
    #[error("Insufficient data for {what}: need at least {needed}, got {got}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        got: usize,
    },
}

impl PipelineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable(message.into())
    }

    pub fn insufficient(what: &'static str, needed: usize, got: usize) -> Self {
        Self::InsufficientData { what, needed, got }
    }

    /// Short label for status lines.
    pub fn kind_label(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid input",
            PipelineError::DataUnavailable(_) => "data unavailable",
            PipelineError::InsufficientData { .. } => "insufficient data",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match err {
            PipelineError::InvalidInput(_) => EXIT_INVALID_INPUT,
            PipelineError::DataUnavailable(_) | PipelineError::InsufficientData { .. } => EXIT_RUNTIME,
        };
        Self::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
