use thiserror::Error;

use crate::domain::DomainError;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
