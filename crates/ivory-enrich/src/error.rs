use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("LLM quota exhausted: {0}")]
    Quota(String),

    #[error("LLM response contained no text")]
    EmptyResponse,

    #[error("LLM response could not be parsed: {0}")]
    MalformedResponse(String),
}
