//! UI-side selection over a published [`VaultState`](crate::index::VaultState).
//!
//! A [`Selection`] holds paths and a search string, never storage handles, and
//! only reads the notes it is given. Folder filtering includes descendants, so
//! the number of visible notes for a folder with an empty search equals that
//! folder's `note_count` after a load.

use crate::model::{is_within, Note};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected folder path; `None` shows the whole vault.
    pub folder: Option<String>,
    /// Selected note path.
    pub note: Option<String>,
    /// Case-insensitive substring matched against name and content.
    pub search: String,
}

impl Selection {
    pub fn in_folder(folder: impl Into<String>) -> Self {
        Self {
            folder: Some(folder.into()),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Notes passing the folder and search filters, in the order given.
    pub fn visible<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        let needle = self.search.trim().to_lowercase();
        notes
            .iter()
            .filter(|n| match self.folder.as_deref() {
                Some(folder) => is_within(&n.path, folder),
                None => true,
            })
            .filter(|n| {
                needle.is_empty()
                    || n.name.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn selected<'a>(&self, notes: &'a [Note]) -> Option<&'a Note> {
        let path = self.note.as_deref()?;
        notes.iter().find(|n| n.path == path)
    }
}
