use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("request to {url} failed: {source}")]
    Retrieval {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not decode feed page from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AvailabilityError {
    /// Bad date or time input. Nothing has been fetched when this is returned.
    pub fn is_validation(&self) -> bool {
        matches!(self, AvailabilityError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, AvailabilityError>;
