use crate::store::Handle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DxfError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(Handle),

    #[error("Table entry not found: {0}")]
    TableEntryNotFound(String),

    #[error("Malformed tag group: {0}")]
    Structure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DxfError>;
