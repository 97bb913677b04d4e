use thiserror::Error;

/// Main error type for the backtester
#[derive(Error, Debug)]
pub enum TraderError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Input data errors
    #[error("Invalid market data: {0}")]
    InvalidData(String),

    #[error("Not enough data: have {have} rows, need at least {need}")]
    InsufficientData { have: usize, need: usize },

    // Replay memory errors
    #[error("Replay memory holds {have} transitions, batch needs {need}")]
    InsufficientSamples { have: usize, need: usize },

    // Checkpoint errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, TraderError>;
