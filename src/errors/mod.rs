use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Source errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No feed discoverable for: {0}")]
    FeedNotDiscoverable(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream returned unusable data: {0}")]
    Upstream(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DigestResult<T> = Result<T, DigestError>;
