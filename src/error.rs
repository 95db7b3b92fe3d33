use thiserror::Error;

/// Main error type for the ranking engine
#[derive(Error, Debug)]
pub enum PlaceRankError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule table document errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid rule table (bad pattern, empty category)
    #[error("Rule table error: {0}")]
    Rules(String),

    /// Provider errors
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Place lookup returned nothing
    #[error("Place not found: {0}")]
    NotFound(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Errors raised while reading configuration from the environment
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

impl From<String> for PlaceRankError {
    fn from(s: String) -> Self {
        PlaceRankError::Other(s)
    }
}

impl From<&str> for PlaceRankError {
    fn from(s: &str) -> Self {
        PlaceRankError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlaceRankError>;
