use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected output file missing: {0}")]
    MissingOutput(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("All contracts API keys have exhausted their quota")]
    KeysExhausted,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
