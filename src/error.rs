use thiserror::Error;

/// Failure on the read path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Failed to fetch users (HTTP {status})")]
    Status { status: u16 },
    #[error("Failed to fetch users: {0}")]
    Transport(String),
    #[error("Failed to decode users: {0}")]
    Decode(String),
}

/// Failure of a (simulated) write.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MutationError {
    #[error("{0}")]
    Rejected(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

/// Errors surfaced by the generic cache actor and its client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}
