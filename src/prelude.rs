pub use paraphrase_core::*;

pub use crate::ingest::IngestOutcome;
pub use crate::query::{SearchResult, Similarity};
pub use crate::source::{BodySource, DocumentProducer, SourceDocument};
pub use crate::store::{DbStats, ParaphraseDb, DB_FILE_NAME};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("storage error: {0}")]
    StorageError(#[from] paraphrase_redb::Error),

    #[error("git error: {0}")]
    GitError(#[from] git2::Error),

    #[error("invalid glob: {0}")]
    GlobError(#[from] regex::Error),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("query is only {size} bytes after normalization, need at least {minimum}")]
    QueryTooShort { size: usize, minimum: usize },

    #[error("document {path} is too short to fingerprint")]
    DocumentTooShort { path: String },

    #[error("database settings are version {found}, this build expects {expected}")]
    SettingsMismatch { found: u32, expected: u32 },

    #[error("no database at {0}, run init first")]
    NotInitialized(String),

    #[error("a database already exists at {0}")]
    AlreadyInitialized(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{failures} of {total} documents failed to ingest")]
    PartialIngest { failures: usize, total: usize },
}

impl Error {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Error {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid_input(text: impl std::fmt::Display) -> Error {
        Error::InvalidInput(text.to_string())
    }
}
