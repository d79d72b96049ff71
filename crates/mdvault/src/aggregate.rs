//! Per-folder note counts.
//!
//! A folder's count is every note whose path lies strictly below the folder's
//! path, at any depth. [`assign_counts`] computes all counts in one bottom-up pass
//! (notes directly in a folder plus the sum over its child folders), which is
//! linear in notes plus folders. [`count_under`] is the direct prefix-match
//! definition and is kept for single-folder queries.

use crate::model::{is_within, FolderItem, Note};
use std::collections::HashMap;

/// Fill in `note_count` for every folder in `tree`.
pub fn assign_counts(tree: &mut [FolderItem], notes: &[Note]) {
    let mut direct: HashMap<&str, usize> = HashMap::new();
    for note in notes {
        *direct.entry(note.folder()).or_default() += 1;
    }
    for item in tree.iter_mut() {
        fill(item, &direct);
    }
}

fn fill(item: &mut FolderItem, direct: &HashMap<&str, usize>) -> usize {
    match item {
        FolderItem::Folder(node) => {
            let below: usize = node.children.iter_mut().map(|c| fill(c, direct)).sum();
            node.note_count = direct.get(node.path.as_str()).copied().unwrap_or(0) + below;
            node.note_count
        }
        FolderItem::Note(_) => 0,
    }
}

/// Number of notes strictly below `folder`.
pub fn count_under(folder: &str, notes: &[Note]) -> usize {
    notes.iter().filter(|n| is_within(&n.path, folder)).count()
}
