use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid argument: {0}")]
    Invalid(String),
}
