use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacefinderError {
    #[error("API error: {0}")]
    Api(#[from] placefinder_api::ApiError),
    #[error("Map error: {0}")]
    Map(#[from] crate::map::MapError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlacefinderError>;
