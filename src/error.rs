use thiserror::Error;

/// Errors returned by FLUX.2 operations.
#[derive(Error, Debug)]
pub enum Flux2Error {
    /// No API key was configured.
    #[error("BFL_API_KEY is not set. Export it or put it in a .env file before making API calls.")]
    MissingApiKey,

    /// A request parameter was out of range or invalid for the chosen model.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The API returned a non-success HTTP status.
    #[error("FLUX.2 API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encode/decode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Flux2Error>;
