use crate::feed::FeedError;
use crate::model::EntryId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaryError {
    #[error("Entry already exists with different content: {0}")]
    DuplicateId(EntryId),

    #[error("Entry not found: {0}")]
    NotFound(EntryId),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, DiaryError>;
