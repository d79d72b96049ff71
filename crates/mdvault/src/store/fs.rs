use super::{
    check_entry_name, DirEntry, DirRef, FileContents, FileRef, RootDir, StorageProvider,
};
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use uuid::Uuid;

/// Handle table. Each distinct path gets exactly one handle for the
/// lifetime of the provider.
#[derive(Default)]
struct Registry {
    dirs: HashMap<DirRef, PathBuf>,
    dir_ids: HashMap<PathBuf, DirRef>,
    files: HashMap<FileRef, PathBuf>,
    file_ids: HashMap<PathBuf, FileRef>,
}

impl Registry {
    fn intern_dir(&mut self, path: PathBuf) -> DirRef {
        if let Some(id) = self.dir_ids.get(&path) {
            return *id;
        }
        let id = DirRef::new();
        self.dirs.insert(id, path.clone());
        self.dir_ids.insert(path, id);
        id
    }

    fn intern_file(&mut self, path: PathBuf) -> FileRef {
        if let Some(id) = self.file_ids.get(&path) {
            return *id;
        }
        let id = FileRef::new();
        self.files.insert(id, path.clone());
        self.file_ids.insert(path, id);
        id
    }
}

/// Storage provider over the local filesystem.
///
/// The "picker" is the directory given at construction: `None` behaves like a
/// dismissed picker. Symbolic links are never followed, so a link cycle cannot
/// trap the scanner.
pub struct FsProvider {
    root: Option<PathBuf>,
    registry: Mutex<Registry>,
}

impl FsProvider {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn dir_path(&self, dir: DirRef) -> Result<PathBuf> {
        self.registry
            .lock()
            .dirs
            .get(&dir)
            .cloned()
            .ok_or_else(|| VaultError::StaleHandle(format!("{:?}", dir)))
    }

    fn file_path(&self, file: FileRef) -> Result<PathBuf> {
        self.registry
            .lock()
            .files
            .get(&file)
            .cloned()
            .ok_or_else(|| VaultError::StaleHandle(format!("{:?}", file)))
    }

    fn child_path(&self, dir: DirRef, name: &str) -> Result<PathBuf> {
        check_entry_name(name)?;
        Ok(self.dir_path(dir)?.join(name))
    }
}

/// Turn one directory entry into a [`DirEntry`], or skip it.
///
/// An entry whose type cannot be read (typically removed between `readdir`
/// and `lstat`) is skipped on its own; its siblings are still listed.
fn classify(path: &Path, name: String, file_type: io::Result<FileType>) -> Option<DirEntry> {
    match file_type {
        Ok(ft) if ft.is_dir() => Some(DirEntry::directory(name)),
        Ok(ft) if ft.is_file() => Some(DirEntry::file(name)),
        Ok(_) => {
            debug!(path = %path.display(), "skipping symlink or special file");
            None
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping entry with unreadable type");
            None
        }
    }
}

#[async_trait]
impl StorageProvider for FsProvider {
    async fn pick_root(&self) -> Result<Option<RootDir>> {
        let Some(root) = self.root.clone() else {
            return Ok(None);
        };
        let meta = tokio::fs::metadata(&root).await?;
        if !meta.is_dir() {
            return Err(VaultError::Storage(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let dir = self.registry.lock().intern_dir(root);
        Ok(Some(RootDir { dir, name }))
    }

    async fn enumerate(&self, dir: DirRef) -> Result<Vec<DirEntry>> {
        let path = self.dir_path(dir)?;
        let mut reader = tokio::fs::read_dir(&path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            let file_type = entry.file_type().await;
            entries.extend(classify(&entry.path(), name, file_type));
        }
        Ok(entries)
    }

    async fn open_subdirectory(&self, dir: DirRef, name: &str) -> Result<DirRef> {
        let path = self.child_path(dir, name)?;
        let meta = tokio::fs::symlink_metadata(&path).await?;
        if !meta.is_dir() {
            return Err(VaultError::Storage(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(self.registry.lock().intern_dir(path))
    }

    async fn open_file(&self, dir: DirRef, name: &str) -> Result<FileRef> {
        let path = self.child_path(dir, name)?;
        let meta = tokio::fs::symlink_metadata(&path).await?;
        if !meta.is_file() {
            return Err(VaultError::Storage(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(self.registry.lock().intern_file(path))
    }

    async fn read_file(&self, file: FileRef) -> Result<FileContents> {
        let path = self.file_path(file)?;
        let content = tokio::fs::read_to_string(&path).await?;
        let meta = tokio::fs::metadata(&path).await?;
        let modified_at: DateTime<Utc> = meta.modified().unwrap_or(SystemTime::now()).into();
        Ok(FileContents {
            content,
            modified_at,
        })
    }

    async fn create_file(&self, dir: DirRef, name: &str) -> Result<FileRef> {
        let path = self.child_path(dir, name)?;
        // No truncate: an existing file keeps its content.
        tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;
        Ok(self.registry.lock().intern_file(path))
    }

    async fn write_file(&self, file: FileRef, content: &str) -> Result<()> {
        let path = self.file_path(file)?;
        let parent = path
            .parent()
            .ok_or_else(|| VaultError::Storage(format!("{} has no parent", path.display())))?;

        // Atomic write: temp file in the same directory, then rename over.
        let tmp_path = parent.join(format!(".mdvault-{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp_path, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}
