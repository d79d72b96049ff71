//! # Initialization
//!
//! [`initialize`] wires a [`VaultIndex`] to the local filesystem and loads the
//! vault's configuration.
//!
//! ## Config Resolution
//!
//! `mdvault.toml` is looked up in two places and merged, later wins:
//!
//! 1. The global config directory: `$MDVAULT_CONFIG_DIR` when set (primarily
//!    for testing), else the OS-appropriate config dir via the `directories` crate.
//! 2. The vault root itself, so per-vault settings travel with the notes.
//!
//! Any load failure falls back to compiled defaults; a broken config file never
//! prevents a vault from opening.
//!
//! ## The Root Directory
//!
//! On the command line there is no picker dialog. The directory passed to
//! [`initialize`] plays that role: `None` behaves like a dismissed picker and
//! `open_vault` reports [`OpenOutcome::Cancelled`](crate::index::OpenOutcome).

use crate::config::VaultConfig;
use crate::index::VaultIndex;
use crate::store::fs::FsProvider;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "mdvault.toml";

pub struct VaultContext {
    pub index: VaultIndex<FsProvider>,
    pub config: VaultConfig,
}

/// Directory holding the user-wide `mdvault.toml`, if one can be determined.
pub fn global_config_dir() -> Option<PathBuf> {
    std::env::var("MDVAULT_CONFIG_DIR")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            ProjectDirs::from("com", "mdvault", "mdvault").map(|d| d.config_dir().to_path_buf())
        })
}

/// Load the merged configuration for a vault rooted at `vault_root`.
pub fn load_config(vault_root: Option<&Path>) -> VaultConfig {
    let search_paths: Vec<SearchPath> = global_config_dir()
        .into_iter()
        .chain(vault_root.map(Path::to_path_buf))
        .map(SearchPath::Path)
        .collect();
    debug!(paths = search_paths.len(), "loading vault config");

    Clapfig::builder()
        .app_name("mdvault")
        .file_name(CONFIG_FILE)
        .search_paths(search_paths)
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Build the filesystem-backed index for `vault`.
pub fn initialize(vault: Option<PathBuf>) -> VaultContext {
    let config = load_config(vault.as_deref());
    let provider = FsProvider::new(vault);
    let index = VaultIndex::new(provider, config.clone());
    VaultContext { index, config }
}
