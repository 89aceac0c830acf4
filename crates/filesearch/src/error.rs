use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileSearchError {
    #[error("invalid root: {0}")]
    InvalidRoot(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FileSearchError>;

impl FileSearchError {
    /// Builds an `InvalidRoot` error for a root path with a cause.
    pub fn invalid_root(root: &Path, cause: impl std::fmt::Display) -> Self {
        Self::InvalidRoot(format!("{}: {cause}", root.display()))
    }
}

/// Error for a poisoned lock guarding the named resource.
pub fn lock_poisoned_error(what: &str) -> FileSearchError {
    FileSearchError::Internal(format!("{what} lock poisoned"))
}
