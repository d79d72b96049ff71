//! # Storage Layer
//!
//! The vault index never touches storage directly. Everything goes through the
//! [`StorageProvider`] trait, a capability-scoped surface modelled on a directory
//! picker: the user grants a root directory, and every further access is made
//! through opaque handles derived from it.
//!
//! ## Handles
//!
//! [`DirRef`] and [`FileRef`] are opaque identities. They carry no path and cannot
//! be constructed from one; only a provider hands them out. Providers intern them
//! by location, so enumerating the same file twice yields the same `FileRef`. The
//! index relies on this: a save is reconciled against the in-memory notes by handle
//! identity, and that identity must survive a reload of the vault.
//!
//! ## Capability Surface
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `pick_root` | Ask the user/platform for a root directory (`None` = cancelled) |
//! | `enumerate` | List direct children of a directory, in no particular order |
//! | `open_subdirectory` | Resolve a child directory name to a handle |
//! | `open_file` | Resolve a child file name to a handle (never creates) |
//! | `read_file` | Full UTF-8 content plus modification time |
//! | `create_file` | Create a file (idempotent: an existing file is left as is) |
//! | `write_file` | Replace the content of a file |
//!
//! Every operation is a suspension point. Timeouts, if any, belong to the
//! provider; the index does not impose one.
//!
//! ## Implementations
//!
//! - [`fs::FsProvider`]: Production provider over the local filesystem (`tokio::fs`).
//! - [`memory::MemProvider`]: For testing logic without filesystem I/O.

use crate::error::{Result, VaultError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

pub mod fs;
pub mod memory;

/// Opaque handle to a directory inside the vault.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirRef(Uuid);

/// Opaque handle to a file inside the vault.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileRef(Uuid);

impl DirRef {
    /// Mint a fresh handle. Providers call this once per distinct directory.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DirRef {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRef {
    /// Mint a fresh handle. Providers call this once per distinct file.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DirRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirRef({})", &self.0.simple().to_string()[..8])
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileRef({})", &self.0.simple().to_string()[..8])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A direct child of an enumerated directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub content: String,
    pub modified_at: DateTime<Utc>,
}

/// The directory granted by [`StorageProvider::pick_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDir {
    pub dir: DirRef,
    /// Display name of the granted directory.
    pub name: String,
}

/// Abstract interface for vault storage.
///
/// Implementations decide where notes live (local disk, memory, a remote mount);
/// the index decides what they mean.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Whether this environment offers local directory access at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Ask for a root directory. `Ok(None)` means the user dismissed the picker.
    async fn pick_root(&self) -> Result<Option<RootDir>>;

    /// List the direct children of `dir`. Order is unspecified.
    async fn enumerate(&self, dir: DirRef) -> Result<Vec<DirEntry>>;

    async fn open_subdirectory(&self, dir: DirRef, name: &str) -> Result<DirRef>;

    /// Resolve an existing file. Fails if `name` is missing or not a file.
    async fn open_file(&self, dir: DirRef, name: &str) -> Result<FileRef>;

    async fn read_file(&self, file: FileRef) -> Result<FileContents>;

    /// Create `name` inside `dir`, or return the existing file untouched.
    async fn create_file(&self, dir: DirRef, name: &str) -> Result<FileRef>;

    /// Replace the whole content of `file`.
    async fn write_file(&self, file: FileRef, content: &str) -> Result<()>;
}

/// Reject names that would escape or alias their parent directory.
pub(crate) fn check_entry_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(VaultError::InvalidName(name.to_string()));
    }
    Ok(())
}
