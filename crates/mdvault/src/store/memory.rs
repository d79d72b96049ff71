use super::{
    check_entry_name, DirEntry, DirRef, EntryKind, FileContents, FileRef, RootDir,
    StorageProvider,
};
use crate::error::{Result, VaultError};
use crate::model::{join_path, parent_path};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;

#[derive(Clone)]
enum MemNode {
    Dir,
    File {
        content: String,
        modified: DateTime<Utc>,
    },
}

/// Number of calls made to each provider operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub pick_root: usize,
    pub enumerate: usize,
    pub open_subdirectory: usize,
    pub open_file: usize,
    pub read_file: usize,
    pub create_file: usize,
    pub write_file: usize,
}

struct MemInner {
    /// Keyed by vault-relative path; "" is the root directory.
    nodes: BTreeMap<String, MemNode>,
    dirs: HashMap<DirRef, String>,
    dir_ids: HashMap<String, DirRef>,
    files: HashMap<FileRef, String>,
    file_ids: HashMap<String, FileRef>,
    failing_enumerate: HashSet<String>,
    failing_read: HashSet<String>,
    failing_write: HashSet<String>,
    simulate_write_error: bool,
    supported: bool,
    cancel_picker: bool,
    yield_on_call: bool,
    calls: CallCounts,
}

impl MemInner {
    fn intern_dir(&mut self, path: &str) -> DirRef {
        if let Some(id) = self.dir_ids.get(path) {
            return *id;
        }
        let id = DirRef::new();
        self.dirs.insert(id, path.to_string());
        self.dir_ids.insert(path.to_string(), id);
        id
    }

    fn intern_file(&mut self, path: &str) -> FileRef {
        if let Some(id) = self.file_ids.get(path) {
            return *id;
        }
        let id = FileRef::new();
        self.files.insert(id, path.to_string());
        self.file_ids.insert(path.to_string(), id);
        id
    }

    fn dir_path(&self, dir: DirRef) -> Result<String> {
        let path = self
            .dirs
            .get(&dir)
            .ok_or_else(|| VaultError::StaleHandle(format!("{:?}", dir)))?;
        match self.nodes.get(path) {
            Some(MemNode::Dir) => Ok(path.clone()),
            _ => Err(not_found(path)),
        }
    }

    fn file_path(&self, file: FileRef) -> Result<String> {
        self.files
            .get(&file)
            .cloned()
            .ok_or_else(|| VaultError::StaleHandle(format!("{:?}", file)))
    }

    fn ensure_dirs(&mut self, path: &str) {
        let mut current = path;
        while !current.is_empty() {
            self.nodes.entry(current.to_string()).or_insert(MemNode::Dir);
            current = parent_path(current);
        }
    }
}

fn not_found(path: &str) -> VaultError {
    io::Error::new(io::ErrorKind::NotFound, format!("no such entry: {}", path)).into()
}

fn denied(path: &str) -> VaultError {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {}", path),
    )
    .into()
}

/// In-memory storage provider for tests and embedding.
///
/// Besides holding a virtual directory tree it records how often each
/// operation was called and can be told to fail specific paths, refuse
/// writes, report itself unsupported, or dismiss the root picker.
/// With [`MemProvider::set_yield_on_call`] every operation yields to the
/// scheduler once before doing its work, which lets tests interleave
/// concurrent index operations deterministically.
pub struct MemProvider {
    inner: Mutex<MemInner>,
    root_name: String,
}

impl Default for MemProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemProvider {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), MemNode::Dir);
        Self {
            inner: Mutex::new(MemInner {
                nodes,
                dirs: HashMap::new(),
                dir_ids: HashMap::new(),
                files: HashMap::new(),
                file_ids: HashMap::new(),
                failing_enumerate: HashSet::new(),
                failing_read: HashSet::new(),
                failing_write: HashSet::new(),
                simulate_write_error: false,
                supported: true,
                cancel_picker: false,
                yield_on_call: false,
                calls: CallCounts::default(),
            }),
            root_name: "vault".to_string(),
        }
    }

    /// Add a file (creating parent directories as needed).
    pub fn add_file(&self, path: &str, content: &str, modified: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.ensure_dirs(parent_path(path));
        inner.nodes.insert(
            path.to_string(),
            MemNode::File {
                content: content.to_string(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: &str) {
        self.inner.lock().ensure_dirs(path);
    }

    /// Remove an entry and everything below it, as an external deletion would.
    pub fn remove(&self, path: &str) {
        let mut inner = self.inner.lock();
        let prefix = format!("{}/", path);
        inner
            .nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    pub fn content(&self, path: &str) -> Option<String> {
        match self.inner.lock().nodes.get(path) {
            Some(MemNode::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    /// Kind of the entry at `path`, if any.
    pub fn kind(&self, path: &str) -> Option<EntryKind> {
        self.inner.lock().nodes.get(path).map(|node| match node {
            MemNode::Dir => EntryKind::Directory,
            MemNode::File { .. } => EntryKind::File,
        })
    }

    /// Set the modification time of a file. Returns false if it does not exist.
    pub fn set_mtime(&self, path: &str, mtime: DateTime<Utc>) -> bool {
        match self.inner.lock().nodes.get_mut(path) {
            Some(MemNode::File { modified, .. }) => {
                *modified = mtime;
                true
            }
            _ => false,
        }
    }

    pub fn fail_enumerate(&self, path: &str) {
        self.inner.lock().failing_enumerate.insert(path.to_string());
    }

    pub fn fail_read(&self, path: &str) {
        self.inner.lock().failing_read.insert(path.to_string());
    }

    pub fn fail_write(&self, path: &str) {
        self.inner.lock().failing_write.insert(path.to_string());
    }

    /// Clear every injected per-path failure.
    pub fn heal(&self) {
        let mut inner = self.inner.lock();
        inner.failing_enumerate.clear();
        inner.failing_read.clear();
        inner.failing_write.clear();
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.inner.lock().simulate_write_error = simulate;
    }

    pub fn set_supported(&self, supported: bool) {
        self.inner.lock().supported = supported;
    }

    pub fn set_cancel_picker(&self, cancel: bool) {
        self.inner.lock().cancel_picker = cancel;
    }

    pub fn set_yield_on_call(&self, enabled: bool) {
        self.inner.lock().yield_on_call = enabled;
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().calls
    }

    async fn enter(&self, op: fn(&mut CallCounts) -> &mut usize) {
        let should_yield = {
            let mut inner = self.inner.lock();
            *op(&mut inner.calls) += 1;
            inner.yield_on_call
        };
        if should_yield {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl StorageProvider for MemProvider {
    fn is_supported(&self) -> bool {
        self.inner.lock().supported
    }

    async fn pick_root(&self) -> Result<Option<RootDir>> {
        self.enter(|c| &mut c.pick_root).await;
        let mut inner = self.inner.lock();
        if inner.cancel_picker {
            return Ok(None);
        }
        let dir = inner.intern_dir("");
        Ok(Some(RootDir {
            dir,
            name: self.root_name.clone(),
        }))
    }

    async fn enumerate(&self, dir: DirRef) -> Result<Vec<DirEntry>> {
        self.enter(|c| &mut c.enumerate).await;
        let inner = self.inner.lock();
        let path = inner.dir_path(dir)?;
        if inner.failing_enumerate.contains(&path) {
            return Err(denied(&path));
        }

        // Children come back in reverse name order; callers must sort.
        let mut entries: Vec<DirEntry> = inner
            .nodes
            .iter()
            .filter(|(key, _)| !key.is_empty() && parent_path(key) == path)
            .map(|(key, node)| {
                let name = crate::model::file_name(key).to_string();
                match node {
                    MemNode::Dir => DirEntry::directory(name),
                    MemNode::File { .. } => DirEntry::file(name),
                }
            })
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn open_subdirectory(&self, dir: DirRef, name: &str) -> Result<DirRef> {
        self.enter(|c| &mut c.open_subdirectory).await;
        check_entry_name(name)?;
        let mut inner = self.inner.lock();
        let path = join_path(&inner.dir_path(dir)?, name);
        if !matches!(inner.nodes.get(&path), Some(MemNode::Dir)) {
            return Err(not_found(&path));
        }
        Ok(inner.intern_dir(&path))
    }

    async fn open_file(&self, dir: DirRef, name: &str) -> Result<FileRef> {
        self.enter(|c| &mut c.open_file).await;
        check_entry_name(name)?;
        let mut inner = self.inner.lock();
        let path = join_path(&inner.dir_path(dir)?, name);
        if !matches!(inner.nodes.get(&path), Some(MemNode::File { .. })) {
            return Err(not_found(&path));
        }
        Ok(inner.intern_file(&path))
    }

    async fn read_file(&self, file: FileRef) -> Result<FileContents> {
        self.enter(|c| &mut c.read_file).await;
        let inner = self.inner.lock();
        let path = inner.file_path(file)?;
        if inner.failing_read.contains(&path) {
            return Err(denied(&path));
        }
        match inner.nodes.get(&path) {
            Some(MemNode::File { content, modified }) => Ok(FileContents {
                content: content.clone(),
                modified_at: *modified,
            }),
            _ => Err(not_found(&path)),
        }
    }

    async fn create_file(&self, dir: DirRef, name: &str) -> Result<FileRef> {
        self.enter(|c| &mut c.create_file).await;
        check_entry_name(name)?;
        let mut inner = self.inner.lock();
        let path = join_path(&inner.dir_path(dir)?, name);
        if inner.simulate_write_error || inner.failing_write.contains(&path) {
            return Err(denied(&path));
        }
        if matches!(inner.nodes.get(&path), Some(MemNode::Dir)) {
            return Err(VaultError::Storage(format!("{} is a directory", path)));
        }
        inner
            .nodes
            .entry(path.clone())
            .or_insert_with(|| MemNode::File {
                content: String::new(),
                modified: Utc::now(),
            });
        Ok(inner.intern_file(&path))
    }

    async fn write_file(&self, file: FileRef, content: &str) -> Result<()> {
        self.enter(|c| &mut c.write_file).await;
        let mut inner = self.inner.lock();
        let path = inner.file_path(file)?;
        if inner.simulate_write_error || inner.failing_write.contains(&path) {
            return Err(denied(&path));
        }
        if !matches!(inner.nodes.get(parent_path(&path)), Some(MemNode::Dir)) {
            return Err(not_found(parent_path(&path)));
        }
        inner.nodes.insert(
            path,
            MemNode::File {
                content: content.to_string(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Millisecond timestamp helper for readable fixtures.
    pub fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub struct VaultFixture {
        pub provider: MemProvider,
    }

    impl Default for VaultFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl VaultFixture {
        pub fn new() -> Self {
            Self {
                provider: MemProvider::new(),
            }
        }

        pub fn with_note(self, path: &str, modified_ms: i64) -> Self {
            let content = format!("# {}\n\nbody of {}\n", path, path);
            self.provider.add_file(path, &content, at(modified_ms));
            self
        }

        pub fn with_file(self, path: &str, content: &str, modified_ms: i64) -> Self {
            self.provider.add_file(path, content, at(modified_ms));
            self
        }

        pub fn with_dir(self, path: &str) -> Self {
            self.provider.add_dir(path);
            self
        }

        /// The three-note vault used throughout the index tests:
        /// `a.md` (t=100), `folder1/b.md` (t=200), `folder1/sub/c.md` (t=50).
        pub fn sample() -> Self {
            Self::new()
                .with_note("a.md", 100)
                .with_note("folder1/b.md", 200)
                .with_note("folder1/sub/c.md", 50)
        }

        pub fn build(self) -> MemProvider {
            self.provider
        }
    }
}
