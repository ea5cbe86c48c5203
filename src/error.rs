use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("ticket {prepid} not found: {message}")]
    TicketNotFound { prepid: String, message: String },
    #[error("ticket service error: {0}")]
    Proxy(String),
    #[error("metadata catalog error: {0}")]
    Catalog(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
