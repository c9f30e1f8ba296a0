use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Store I/O error: {0}")]
    StoreIo(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn log(&self) {
        match self {
            AppError::StoreIo(msg) => tracing::error!("Store I/O failure: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal failure: {}", msg),
            AppError::Collaborator(msg) => tracing::warn!("Collaborator failure: {}", msg),
            other => tracing::debug!("{}", other),
        }
    }
}
