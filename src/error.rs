use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum HordeError {
    /// The Horde asked for kudos upfront for this size/steps combination (HTTP 403).
    #[error("Kudos upfront required: {0}")]
    InsufficientCredit(String),

    #[error("Submit failed ({status}): {body}")]
    SubmitFailed { status: u16, body: String },

    #[error("Status error ({status}): {body}")]
    StatusQueryFailed { status: u16, body: String },

    #[error("Timed out waiting for generation after {:?}", .0)]
    TimedOut(Duration),

    #[error("No image returned.")]
    EmptyResult,

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response error: {0}")]
    Response(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl HordeError {
    pub fn is_insufficient_credit(&self) -> bool {
        matches!(self, HordeError::InsufficientCredit(_))
    }
}

pub type Result<T> = std::result::Result<T, HordeError>;
