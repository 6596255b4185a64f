use thiserror::Error;

pub type PlayerResult<T> = Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("native playback engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("invalid player configuration: {0}")]
    Configuration(String),
    #[error("playback engine teardown failed: {0}")]
    Teardown(String),
}

impl PlayerError {
    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        PlayerError::EngineUnavailable(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PlayerError::Configuration(message.into())
    }

    pub fn teardown(message: impl Into<String>) -> Self {
        PlayerError::Teardown(message.into())
    }
}
