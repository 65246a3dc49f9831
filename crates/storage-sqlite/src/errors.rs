use smartpower_core::Error as CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection lock poisoned")]
    Poisoned,
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        log::error!("[Storage] {}", err);
        CoreError::storage(err.to_string())
    }
}
