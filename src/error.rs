use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutreachError>;

/// Everything that can go wrong in the app. None of these are fatal: the
/// worst outcome is a stale or incomplete view.
#[derive(Error, Debug)]
pub enum OutreachError {
    /// Boundary geometry could not be fetched or decoded. The map stays
    /// uninitialized for the rest of the session.
    #[error("map data unavailable: {0}")]
    DataUnavailable(String),

    /// The record store rejected a read or write.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("company {0} not found")]
    NotFound(String),

    #[error("blob storage failure: {0}")]
    Blob(String),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid chart config: {0}")]
    InvalidChartConfig(String),
}

impl From<reqwest::Error> for OutreachError {
    fn from(e: reqwest::Error) -> Self {
        OutreachError::DataUnavailable(e.to_string())
    }
}

impl From<geozero::error::GeozeroError> for OutreachError {
    fn from(e: geozero::error::GeozeroError) -> Self {
        OutreachError::DataUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for OutreachError {
    fn from(e: serde_json::Error) -> Self {
        OutreachError::Persistence(e.to_string())
    }
}
