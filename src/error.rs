use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShimmyError {
    #[error("Script registry unreadable: {0}")]
    ManifestUnreadable(String),

    #[error("Invalid source reference: {0}")]
    SourceRef(String),

    #[error("Version resolution failed: {0}")]
    Resolution(String),

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShimmyError>;
