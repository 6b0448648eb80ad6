use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestGenError {
   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("Parse error: {0}")]
   ParseError(String),

   #[error("API request failed (HTTP {status}): {body}")]
   ApiError { status: u16, body: String },

   #[error("API call failed after {retries} retries: {source}")]
   ApiRetryExhausted {
      retries: u32,
      #[source]
      source:  Box<Self>,
   },

   #[error("Validation failed: {0}")]
   ValidationError(String),

   #[error("Not found: {0}")]
   NotFound(String),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   JsonError(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   HttpError(#[from] reqwest::Error),

   #[error("{0}")]
   Other(String),
}

pub type Result<T> = std::result::Result<T, TestGenError>;
