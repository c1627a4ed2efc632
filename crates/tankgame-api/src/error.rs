use tankgame_types::{Envelope, Status};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unknown email and wrong password share this variant and its message.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(&'static str),

    #[error("DB Error: {0:#}")]
    Db(#[from] anyhow::Error),

    #[error("DB Error: password hashing failed: {0}")]
    Hash(String),
}

impl ServiceError {
    pub fn status(&self) -> Status {
        match self {
            ServiceError::InvalidCredentials => Status::Forbidden,
            ServiceError::NotFound(_)
            | ServiceError::Invalid(_)
            | ServiceError::Db(_)
            | ServiceError::Hash(_) => Status::BadRequest,
        }
    }
}

/// Folds an operation result into its envelope, logging failures.
pub(crate) fn respond<T>(
    op: &'static str,
    result: Result<T, ServiceError>,
    message: &str,
) -> Envelope<T> {
    match result {
        Ok(data) => Envelope::ok(data, message),
        Err(e) => failure(op, e),
    }
}

/// Like [`respond`] for operations whose success carries no payload.
pub(crate) fn respond_empty(
    op: &'static str,
    result: Result<(), ServiceError>,
    message: &str,
) -> Envelope<()> {
    match result {
        Ok(()) => Envelope::ok_empty(message),
        Err(e) => failure(op, e),
    }
}

fn failure<T>(op: &'static str, e: ServiceError) -> Envelope<T> {
    match &e {
        ServiceError::InvalidCredentials => warn!(op, "{}", e),
        _ => error!(op, "{}", e),
    }
    Envelope::failure(e.status(), e.to_string())
}
