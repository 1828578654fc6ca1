use thiserror::Error;

use crate::domain::UserId;
use crate::error::{CacheError, FetchError, MutationError};
use crate::validation::FieldErrors;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error(transparent)]
    Fetch(FetchError),
    #[error(transparent)]
    Mutation(MutationError),
    #[error("User not found: {0}")]
    NotFound(UserId),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<CacheError> for UserError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Fetch(e) => UserError::Fetch(e),
            CacheError::Mutation(e) => UserError::Mutation(e),
            CacheError::ActorCommunication(msg) => UserError::ActorCommunicationError(msg),
        }
    }
}
