//! # Configuration
//!
//! Vault configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files and environment variables (see [`crate::init`]).
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `MDVAULT__NOTE_EXT`, `MDVAULT__TREE_MODE`, etc.
//! 2. **Vault Config**: `<vault>/mdvault.toml`, travels with the vault.
//! 3. **Global Config**: OS-appropriate config directory (via `directories` crate),
//!    or `$MDVAULT_CONFIG_DIR` when set.
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `note_ext` | `.md` | Suffix that marks a file as a note (case-sensitive) |
//! | `new_note_template` | `# New Note\n\n` | Initial content of created notes |
//! | `tree_mode` | `folders` | `folders`: sidebar lists folders only; `notes`: notes as leaves |
//! | `max_depth` | `64` | Deeper directories are skipped with a warning |

use crate::model::TreeMode;
use crate::scanner::ScanOptions;
use confique::Config;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPLATE: &str = "# New Note\n\n";

/// Configuration for a vault, stored in `mdvault.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct VaultConfig {
    /// Suffix of note files (e.g. ".md", ".markdown")
    #[config(default = ".md")]
    pub note_ext: String,

    /// Content written into every newly created note
    #[config(default = "# New Note\n\n")]
    pub new_note_template: String,

    /// Whether the sidebar tree lists notes ("notes") or folders only ("folders")
    #[config(default = "folders")]
    pub tree_mode: TreeMode,

    /// Maximum directory nesting walked below the vault root
    #[config(default = 64)]
    pub max_depth: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            note_ext: ".md".to_string(),
            new_note_template: DEFAULT_TEMPLATE.to_string(),
            tree_mode: TreeMode::Folders,
            max_depth: 64,
        }
    }
}

impl VaultConfig {
    /// Get the note extension, normalized to start with a dot.
    pub fn note_ext(&self) -> String {
        if self.note_ext.starts_with('.') {
            self.note_ext.clone()
        } else {
            format!(".{}", self.note_ext)
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            note_ext: self.note_ext(),
            tree_mode: self.tree_mode,
            max_depth: self.max_depth,
        }
    }
}
