use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the vault index and its storage providers.
///
/// The enum is `Clone` so that one load result can be handed to every caller
/// that attached to the same in-flight refresh. I/O errors are shared behind
/// an `Arc` for that reason.
#[derive(Error, Debug, Clone)]
pub enum VaultError {
    #[error("Local file access is not supported by this storage provider")]
    Unsupported,

    #[error("No vault is open")]
    NotOpen,

    #[error("Failed to load vault: {0}")]
    Scan(String),

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown storage handle: {0}")]
    StaleHandle(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Note already exists: {0}")]
    NoteExists(String),

    #[error("Invalid note name: {0:?}")]
    InvalidName(String),

    #[error("Load was abandoned before it completed")]
    LoadAbandoned,

    #[error("Vault changed while loading; result discarded")]
    Superseded,
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Io(Arc::new(err))
    }
}

impl VaultError {
    /// True if the error reports a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
