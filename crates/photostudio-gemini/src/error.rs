use photostudio_proto::GenerationFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generation is not available in this region")]
    RegionRestricted,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No image in response: {0}")]
    NoImage(String),

    #[error("Malformed response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, GeminiError>;

impl From<GeminiError> for GenerationFailure {
    fn from(error: GeminiError) -> Self {
        match error {
            GeminiError::RegionRestricted => GenerationFailure::RegionRestricted,
            GeminiError::ModelNotFound(_) => GenerationFailure::ModelNotFound,
            GeminiError::NoImage(_) => GenerationFailure::NoImageReturned,
            other => GenerationFailure::BackendError(other.to_string()),
        }
    }
}
