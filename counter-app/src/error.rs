use graphql_link::LinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid log level {0}")]
    LogLevel(String),

    #[error("failed to initialise logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("invalid click {0}, expected increment_with_abort or increment")]
    InvalidClick(String),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<figment::Error> for AppError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
