//! # Domain Model: Notes and the Folder Tree
//!
//! This module defines the data the vault index publishes: [`Note`] (one Markdown
//! file) and [`FolderItem`] (one entry of the sidebar tree).
//!
//! ## Paths
//!
//! Every note and folder is keyed by a slash-separated path relative to the vault
//! root. The empty string denotes the root itself. Paths are built by the scanner
//! with [`join_path`] and are never parsed back into storage locations: each
//! [`Note`] owns the [`FileRef`] it was read through.
//!
//! ## The Folder Tree
//!
//! The tree is a tagged recursive structure. A [`FolderItem::Folder`] always owns
//! its children; a [`FolderItem::Note`] is a leaf and only appears when the tree is
//! built in [`TreeMode::Notes`]. Children are ordered folders first, then by name
//! using plain byte-wise (case-sensitive) string comparison, so rescanning an
//! unchanged vault yields an identical tree.
//!
//! ## Note Counts
//!
//! `FolderNode::note_count` is the number of notes anywhere below the folder. It is
//! filled in by [`crate::aggregate`] after each full load and is not patched when a
//! single note is created (see `VaultState::counts_stale`).

use crate::store::FileRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A Markdown file discovered in (or created through) the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub name: String,
    pub path: String,
    pub content: String,
    pub last_modified: DateTime<Utc>,
    #[serde(skip)]
    storage_ref: FileRef,
}

impl Note {
    pub fn new(
        path: String,
        content: String,
        last_modified: DateTime<Utc>,
        storage_ref: FileRef,
    ) -> Self {
        let name = file_name(&path).to_string();
        Self {
            name,
            path,
            content,
            last_modified,
            storage_ref,
        }
    }

    /// The storage identity this note was read through.
    pub fn storage_ref(&self) -> FileRef {
        self.storage_ref
    }

    /// Path of the folder containing this note ("" for the vault root).
    pub fn folder(&self) -> &str {
        parent_path(&self.path)
    }

    /// First non-empty line with leading `#` markers stripped, or the file stem.
    pub fn title(&self) -> &str {
        self.content
            .lines()
            .map(|line| line.trim_start_matches('#').trim())
            .find(|line| !line.is_empty())
            .unwrap_or_else(|| {
                self.name
                    .rsplit_once('.')
                    .map_or(self.name.as_str(), |(stem, _)| stem)
            })
    }
}

/// Whether the sidebar tree lists notes as leaves or folders only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMode {
    #[default]
    Folders,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
}

/// One entry of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FolderItem {
    Folder(FolderNode),
    #[serde(rename = "file")]
    Note(NoteLeaf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub name: String,
    pub path: String,
    pub note_count: usize,
    pub children: Vec<FolderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteLeaf {
    pub name: String,
    pub path: String,
}

impl FolderItem {
    pub fn folder(path: String, children: Vec<FolderItem>) -> Self {
        FolderItem::Folder(FolderNode {
            name: file_name(&path).to_string(),
            path,
            note_count: 0,
            children,
        })
    }

    pub fn note(path: String) -> Self {
        FolderItem::Note(NoteLeaf {
            name: file_name(&path).to_string(),
            path,
        })
    }

    /// Identity of the entry; identical to its path.
    pub fn id(&self) -> &str {
        self.path()
    }

    pub fn name(&self) -> &str {
        match self {
            FolderItem::Folder(node) => &node.name,
            FolderItem::Note(leaf) => &leaf.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            FolderItem::Folder(node) => &node.path,
            FolderItem::Note(leaf) => &leaf.path,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            FolderItem::Folder(_) => ItemKind::Folder,
            FolderItem::Note(_) => ItemKind::File,
        }
    }

    /// Notes below this folder; `None` for note leaves.
    pub fn note_count(&self) -> Option<usize> {
        match self {
            FolderItem::Folder(node) => Some(node.note_count),
            FolderItem::Note(_) => None,
        }
    }

    pub fn children(&self) -> &[FolderItem] {
        match self {
            FolderItem::Folder(node) => &node.children,
            FolderItem::Note(_) => &[],
        }
    }

    /// Sibling order: folders before files, then byte-wise by name.
    pub fn tree_order(a: &FolderItem, b: &FolderItem) -> Ordering {
        let rank = |item: &FolderItem| match item.kind() {
            ItemKind::Folder => 0,
            ItemKind::File => 1,
        };
        rank(a).cmp(&rank(b)).then_with(|| a.name().cmp(b.name()))
    }
}

/// Find a folder anywhere in the tree by path.
pub fn find_folder<'a>(items: &'a [FolderItem], path: &str) -> Option<&'a FolderNode> {
    for item in items {
        if let FolderItem::Folder(node) = item {
            if node.path == path {
                return Some(node);
            }
            let is_ancestor = path
                .strip_prefix(node.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
            if is_ancestor {
                return find_folder(&node.children, path);
            }
        }
    }
    None
}

/// Order notes most recently modified first; ties broken by path.
pub fn sort_by_recency(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.path.cmp(&b.path))
    });
}

pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// True if `path` lies strictly inside `folder` ("" contains everything).
pub fn is_within(path: &str, folder: &str) -> bool {
    if folder.is_empty() {
        return true;
    }
    path.strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/'))
}
