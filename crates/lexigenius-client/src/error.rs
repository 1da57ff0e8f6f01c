use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("AI error: {0}")]
    Analysis(String),
    #[error("malformed suggestion: {0}")]
    Decode(String),
    #[error("invalid service URL: {0}")]
    Url(String),
}
