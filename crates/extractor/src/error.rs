use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("channel not found: {0}")]
    StreamerNotFound(String),
    #[error("video not found: {0}")]
    VideoNotFound(String),
    #[error("no streams found")]
    NoStreamsFound,
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("hls playlist error: {0}")]
    HlsPlaylistError(String),
}
