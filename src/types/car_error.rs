use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarError {
    #[error("car with id {0} already exists")]
    AlreadyExists(String),
    #[error("car with id {0} not exist")]
    NotFound(String),
    #[error("car id must not be empty")]
    MissingId,
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}
