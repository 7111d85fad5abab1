use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
