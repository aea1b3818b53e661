use thiserror::Error;
use uuid::Uuid;

use crate::models::Status;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("catalog entry {id} not found")]
    NotFound { id: Uuid },

    #[error("catalog entry cannot move from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("catalog entry {id} already exists")]
    Conflict { id: Uuid },

    #[error("storage backend failure: {0}")]
    Backend(String),
}
