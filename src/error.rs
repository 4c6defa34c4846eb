use thiserror::Error;

/// Boxed failure returned by host-provided collaborators (rasterizers, sinks).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid analysis result: {0}")]
    InvalidAnalysis(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("staging area already holds a block")]
    StageOccupied,

    #[error("failed to render block `{block}`: {source}")]
    Render {
        block: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("image error: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("failed to save `{filename}`: {source}")]
    Save {
        filename: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("a report export is already in progress")]
    Busy,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidAnalysis(e.to_string())
    }
}
