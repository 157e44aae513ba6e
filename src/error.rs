use thiserror::Error;

// Error types for the tracking client
#[derive(Error, Debug)]
pub enum TrackingError {
    // Connection failures, timeouts and non-2xx statuses, passed through untouched
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request serialization error: {0}")]
    Serialization(String),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
