//! # Directory Scanner
//!
//! Walks a vault depth-first and produces, in one traversal, the flat list of
//! notes and the folder tree mirroring the directory structure.
//!
//! ## Traversal
//!
//! For each directory the scanner enumerates the direct children, sorts them
//! (directories first, then byte-wise by name) and then handles them in order:
//!
//! - **Directory**: open it, recurse, and append the returned sub-tree and notes.
//! - **Note file** (name ends with the note extension, case-sensitive): open it,
//!   read content and modification time, append a [`Note`].
//! - **Anything else**: skipped silently.
//!
//! Provider enumeration order is never trusted; the sort makes the output a pure
//! function of the directory contents.
//!
//! ## Partial Failures
//!
//! Only a failure to enumerate the starting directory aborts the scan. Every other
//! failure (a subdirectory that cannot be opened or listed, a file that cannot be
//! read, a directory beyond `max_depth`) skips that entry and records a
//! [`ScanWarning`], so a single unreadable file does not blank the vault.
//!
//! ## Cost
//!
//! One enumeration per directory and one full read per note. Content is loaded
//! eagerly; for very large vaults this is the dominant cost of a load.

use crate::error::{Result, VaultError};
use crate::model::{join_path, FolderItem, Note, TreeMode};
use crate::store::{DirEntry, DirRef, EntryKind, StorageProvider};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Recognized note suffix, including the dot.
    pub note_ext: String,
    pub tree_mode: TreeMode,
    /// Directories nested deeper than this are skipped with a warning.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            note_ext: ".md".to_string(),
            tree_mode: TreeMode::Folders,
            max_depth: 64,
        }
    }
}

impl ScanOptions {
    pub fn is_note(&self, name: &str) -> bool {
        name.len() > self.note_ext.len() && name.ends_with(&self.note_ext)
    }
}

/// An entry the scanner had to skip.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScanWarning {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Notes in traversal order.
    pub notes: Vec<Note>,
    /// Top-level tree items; `note_count` not yet assigned.
    pub tree: Vec<FolderItem>,
    /// Handle of every folder walked, keyed by path.
    pub folders: HashMap<String, DirRef>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutput {
    fn skip(&mut self, path: String, reason: impl fmt::Display) {
        let reason = reason.to_string();
        warn!(%path, %reason, "skipping unreadable vault entry");
        self.warnings.push(ScanWarning { path, reason });
    }

    fn absorb(&mut self, child: ScanOutput) {
        self.notes.extend(child.notes);
        self.folders.extend(child.folders);
        self.warnings.extend(child.warnings);
    }
}

/// Scan the directory `dir`, whose vault-relative path is `prefix` ("" for the root).
///
/// Fails only if `dir` itself cannot be enumerated.
pub async fn scan<P>(
    provider: &P,
    dir: DirRef,
    prefix: &str,
    options: &ScanOptions,
) -> Result<ScanOutput>
where
    P: StorageProvider + ?Sized,
{
    walk(provider, dir, prefix.to_string(), 0, options)
        .await
        .map_err(|e| VaultError::Scan(e.to_string()))
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<ScanOutput>> + Send + 'a>>;

fn walk<'a, P>(
    provider: &'a P,
    dir: DirRef,
    prefix: String,
    depth: usize,
    options: &'a ScanOptions,
) -> WalkFuture<'a>
where
    P: StorageProvider + ?Sized,
{
    Box::pin(async move {
        debug!(path = %prefix, depth, "walking directory");
        let mut entries = provider.enumerate(dir).await?;
        entries.sort_by(entry_order);

        let mut out = ScanOutput::default();
        for entry in entries {
            let path = join_path(&prefix, &entry.name);
            match entry.kind {
                EntryKind::Directory => {
                    if depth + 1 > options.max_depth {
                        out.skip(path, format!("nested deeper than {}", options.max_depth));
                        continue;
                    }
                    let sub = match provider.open_subdirectory(dir, &entry.name).await {
                        Ok(sub) => sub,
                        Err(e) => {
                            out.skip(path, e);
                            continue;
                        }
                    };
                    match walk(provider, sub, path.clone(), depth + 1, options).await {
                        Ok(mut child) => {
                            let children = std::mem::take(&mut child.tree);
                            out.folders.insert(path.clone(), sub);
                            out.tree.push(FolderItem::folder(path, children));
                            out.absorb(child);
                        }
                        Err(e) => out.skip(path, e),
                    }
                }
                EntryKind::File if options.is_note(&entry.name) => {
                    let read = async {
                        let file = provider.open_file(dir, &entry.name).await?;
                        let contents = provider.read_file(file).await?;
                        Ok::<_, VaultError>((file, contents))
                    };
                    match read.await {
                        Ok((file, contents)) => {
                            if options.tree_mode == TreeMode::Notes {
                                out.tree.push(FolderItem::note(path.clone()));
                            }
                            out.notes.push(Note::new(
                                path,
                                contents.content,
                                contents.modified_at,
                                file,
                            ));
                        }
                        Err(e) => out.skip(path, e),
                    }
                }
                EntryKind::File => {}
            }
        }

        out.tree.sort_by(FolderItem::tree_order);
        Ok(out)
    })
}

fn entry_order(a: &DirEntry, b: &DirEntry) -> std::cmp::Ordering {
    let rank = |e: &DirEntry| match e.kind {
        EntryKind::Directory => 0,
        EntryKind::File => 1,
    };
    rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{at, VaultFixture};
    use crate::store::memory::MemProvider;

    async fn scan_all(provider: &MemProvider, options: &ScanOptions) -> Result<ScanOutput> {
        let root = provider.pick_root().await.unwrap().unwrap();
        scan(provider, root.dir, "", options).await
    }

    fn names(items: &[FolderItem]) -> Vec<&str> {
        items.iter().map(|i| i.name()).collect()
    }

    #[tokio::test]
    async fn test_scan_finds_notes_at_every_depth() {
        let provider = VaultFixture::sample().build();
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        let mut paths: Vec<_> = out.notes.iter().map(|n| n.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["a.md", "folder1/b.md", "folder1/sub/c.md"]);
        assert!(out.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_scan_reads_content_and_mtime() {
        let provider = VaultFixture::new().with_file("x.md", "# X\n", 123).build();
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        assert_eq!(out.notes[0].content, "# X\n");
        assert_eq!(out.notes[0].last_modified, at(123));
        assert_eq!(out.notes[0].name, "x.md");
    }

    #[tokio::test]
    async fn test_folder_tree_mirrors_directories_only() {
        let provider = VaultFixture::sample().build();
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        assert_eq!(names(&out.tree), vec!["folder1"]);
        let folder1 = &out.tree[0];
        assert_eq!(folder1.path(), "folder1");
        assert_eq!(names(folder1.children()), vec!["sub"]);
        assert_eq!(folder1.children()[0].path(), "folder1/sub");
        assert!(out.folders.contains_key("folder1/sub"));
    }

    #[tokio::test]
    async fn test_notes_mode_lists_leaves_after_folders() {
        let provider = VaultFixture::sample().with_note("folder1/a.md", 1).build();
        let options = ScanOptions {
            tree_mode: TreeMode::Notes,
            ..ScanOptions::default()
        };
        let out = scan_all(&provider, &options).await.unwrap();

        assert_eq!(names(&out.tree), vec!["folder1", "a.md"]);
        assert_eq!(names(out.tree[0].children()), vec!["sub", "a.md", "b.md"]);
        assert_eq!(out.tree[1].note_count(), None);
    }

    #[tokio::test]
    async fn test_non_note_files_are_ignored_but_their_dirs_walked() {
        let provider = VaultFixture::new()
            .with_file("image.png", "x", 1)
            .with_file("README.MD", "upper-case suffix", 1)
            .with_file(".md", "bare suffix", 1)
            .with_file("assets/deep/keep.md", "k", 1)
            .build();
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        let paths: Vec<_> = out.notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["assets/deep/keep.md"]);
        assert!(out.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directories_still_appear() {
        let provider = VaultFixture::new().with_dir("empty").build();
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();
        assert_eq!(names(&out.tree), vec!["empty"]);
        assert!(out.notes.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped_with_warning() {
        let provider = VaultFixture::sample().build();
        provider.fail_read("folder1/b.md");
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        assert_eq!(out.notes.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].path, "folder1/b.md");
    }

    #[tokio::test]
    async fn test_unlistable_subdirectory_is_skipped_with_warning() {
        let provider = VaultFixture::sample().build();
        provider.fail_enumerate("folder1/sub");
        let out = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        let paths: Vec<_> = out.notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["folder1/b.md", "a.md"]);
        assert!(out.tree[0].children().is_empty());
        assert_eq!(out.warnings[0].path, "folder1/sub");
    }

    #[tokio::test]
    async fn test_unlistable_root_is_fatal() {
        let provider = VaultFixture::sample().build();
        provider.fail_enumerate("");
        let err = scan_all(&provider, &ScanOptions::default()).await.unwrap_err();
        assert!(matches!(err, VaultError::Scan(_)));
    }

    #[tokio::test]
    async fn test_depth_limit_skips_deep_directories() {
        let provider = VaultFixture::new()
            .with_note("l1/top.md", 1)
            .with_note("l1/l2/deep.md", 1)
            .build();
        let options = ScanOptions {
            max_depth: 1,
            ..ScanOptions::default()
        };
        let out = scan_all(&provider, &options).await.unwrap();

        let paths: Vec<_> = out.notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["l1/top.md"]);
        assert_eq!(out.warnings[0].path, "l1/l2");
    }

    #[tokio::test]
    async fn test_rescan_is_deterministic() {
        let provider = VaultFixture::sample()
            .with_dir("Zed")
            .with_dir("alpha")
            .with_dir("Beta")
            .build();
        let first = scan_all(&provider, &ScanOptions::default()).await.unwrap();
        let second = scan_all(&provider, &ScanOptions::default()).await.unwrap();

        assert_eq!(first.tree, second.tree);
        assert_eq!(first.notes, second.notes);
        assert_eq!(names(&first.tree), vec!["Beta", "Zed", "alpha", "folder1"]);
    }

    #[tokio::test]
    async fn test_scan_with_prefix_builds_nested_paths() {
        let provider = VaultFixture::sample().build();
        let root = provider.pick_root().await.unwrap().unwrap();
        let folder = provider.open_subdirectory(root.dir, "folder1").await.unwrap();

        let out = scan(&provider, folder, "folder1", &ScanOptions::default())
            .await
            .unwrap();
        let paths: Vec<_> = out.notes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["folder1/sub/c.md", "folder1/b.md"]);
    }
}
