use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("analyzer: interval must be non-zero")]
    ErrInvalidAnalyzerInterval,
    #[error("analyzer: quality interval must not be shorter than the analyzer interval")]
    ErrInvalidQualityInterval,
    #[error("analyzer: already started")]
    ErrAnalyzerAlreadyStarted,
    #[error("analyzer: not started")]
    ErrAnalyzerNotStarted,
    #[error("analyzer: invalid config: {0}")]
    ErrInvalidConfig(String),
    #[error("stats: fetch failed: {0}")]
    ErrStatsFetch(String),
    #[error("connection: handle closed")]
    ErrConnectionClosed,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ErrInvalidConfig(e.to_string())
    }
}
