use thiserror::Error;

/// Error types for fetcher and parser operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed payload: {message}")]
    Parse { message: String },

    #[error("Upstream returned {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("Invalid input: {0}")]
    Config(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("No data available for {asset} from {source_name}")]
    NoData { asset: String, source_name: String },

    #[error("Feed error: {0}")]
    Feed(#[from] rss::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for fetchers and parsers
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// Whether a later attempt could plausibly succeed.
    /// Only used to pick a log level; the pipeline never retries inside a cycle.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) => true,
            DataError::Api { status_code, .. } => *status_code >= 500 || *status_code == 429,
            _ => false,
        }
    }

    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        DataError::Parse {
            message: message.into(),
        }
    }

    pub fn api_error<S: Into<String>>(status_code: u16, message: S) -> Self {
        DataError::Api {
            status_code,
            message: message.into(),
        }
    }

    pub fn no_data<A: Into<String>, S: Into<String>>(asset: A, source_name: S) -> Self {
        DataError::NoData {
            asset: asset.into(),
            source_name: source_name.into(),
        }
    }
}
