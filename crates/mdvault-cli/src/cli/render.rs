//! # Rendering Module
//!
//! Turns index snapshots into terminal text. Every function returns a `String`
//! so output can be asserted in tests; printing happens in `commands`.
//!
//! Layout math (width, truncation, padding) is Unicode-aware: titles are
//! measured in terminal columns, not bytes or chars.

use super::styles;
use chrono::{DateTime, Utc};
use mdvault::model::{FolderItem, Note};
use mdvault::scanner::ScanWarning;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TITLE_WIDTH: usize = 40;
pub const PATH_WIDTH: usize = 36;

pub fn render_list(notes: &[&Note], now: DateTime<Utc>) -> String {
    if notes.is_empty() {
        return format!("{}\n", styles::muted().apply_to("No notes found."));
    }
    let mut out = String::new();
    for note in notes {
        let title = fit(note.title(), TITLE_WIDTH);
        let path = fit(&note.path, PATH_WIDTH);
        out.push_str(&format!(
            "{} {} {}\n",
            styles::title().apply_to(title),
            styles::muted().apply_to(path),
            styles::time().apply_to(time_ago(note.last_modified, now)),
        ));
    }
    out
}

/// The sidebar tree, headed by the vault name and its total note count.
pub fn render_tree(vault_name: &str, total: usize, tree: &[FolderItem], stale: bool) -> String {
    let mut out = format!(
        "{} {}\n",
        styles::folder().apply_to(vault_name),
        styles::count().apply_to(format!("({})", total))
    );
    push_items(&mut out, tree, 1);
    if stale {
        out.push_str(&format!(
            "{}\n",
            styles::muted().apply_to("(counts refresh on next load)")
        ));
    }
    out
}

fn push_items(out: &mut String, items: &[FolderItem], depth: usize) {
    let indent = "  ".repeat(depth);
    for item in items {
        match item {
            FolderItem::Folder(node) => {
                out.push_str(&format!(
                    "{}{} {}\n",
                    indent,
                    styles::folder().apply_to(format!("{}/", node.name)),
                    styles::count().apply_to(format!("({})", node.note_count))
                ));
                push_items(out, &node.children, depth + 1);
            }
            FolderItem::Note(leaf) => {
                out.push_str(&format!("{}{}\n", indent, leaf.name));
            }
        }
    }
}

pub fn render_note(note: &Note, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{}  {}\n\n",
        styles::muted().apply_to(&note.path),
        styles::time().apply_to(time_ago(note.last_modified, now))
    );
    out.push_str(&note.content);
    if !note.content.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub fn render_success(message: &str) -> String {
    format!("{}\n", styles::success().apply_to(message))
}

pub fn render_warnings(warnings: &[ScanWarning]) -> String {
    let mut out = String::new();
    if warnings.is_empty() {
        return out;
    }
    out.push_str(&format!(
        "{}\n",
        styles::warning().apply_to(format!("Skipped {} unreadable entries:", warnings.len()))
    ));
    for warning in warnings {
        out.push_str(&format!("  {}\n", warning));
    }
    out
}

pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now
        .signed_duration_since(timestamp)
        .to_std()
        .unwrap_or_default();
    timeago::Formatter::new().convert(elapsed)
}

/// Truncate to `width` columns (with an ellipsis) or pad with spaces to exactly `width`.
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return format!("{}{}", text, " ".repeat(width - text.width()));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
