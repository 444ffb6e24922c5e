use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("extraction error: {0}")]
    Extraction(#[from] twitch_extractor::ExtractorError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("player error: {0}")]
    Player(String),

    /// A spawned fetch task panicked or was cancelled before finishing.
    #[error("fetch task failed: {0}")]
    Task(String),

    #[error("operation cancelled by user")]
    UserCancelled,
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        // anyhow's alternate format includes the context chain.
        CliError::Config(format!("{e:#}"))
    }
}

impl CliError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        CliError::InvalidInput(msg.into())
    }

    pub fn user_cancelled() -> Self {
        CliError::UserCancelled
    }

    pub fn player<S: Into<String>>(msg: S) -> Self {
        CliError::Player(msg.into())
    }
}
