//! # Mdvault Architecture
//!
//! Mdvault is the **index behind a note-taking UI** whose notes are plain Markdown
//! files in a user-chosen directory (the "vault"). Rendering, editing and toasts
//! belong to whatever front end embeds it; this crate walks the directory, keeps an
//! in-memory model of notes and folders, and applies create/save without
//! rescanning.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Front End (mdvault-cli, or any UI)                         │
//! │  - Holds a Selection, renders VaultState snapshots          │
//! │  - The ONLY place that knows about terminals or widgets     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Vault Index (index.rs)                                     │
//! │  - open_vault / refresh / create_note / save_note           │
//! │  - Single-flight loads, atomic publishing via watch         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Scanner + Aggregator (scanner.rs, aggregate.rs)            │
//! │  - One depth-first walk: flat notes + folder tree           │
//! │  - Bottom-up note counts                                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract StorageProvider trait, opaque handles           │
//! │  - FsProvider (production), MemProvider (testing)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Handles Stay Inside
//!
//! Storage handles ([`store::DirRef`], [`store::FileRef`]) are minted by a provider
//! and owned by the index. Front ends address notes and folders by vault-relative
//! path and request every mutation through [`index::VaultIndex`].
//!
//! ## Testing Strategy
//!
//! - **Unit tests** sit beside the code and drive the index through
//!   [`store::memory::MemProvider`], which counts calls, injects faults and can
//!   yield on every operation to force interleavings.
//! - **Integration tests** (`tests/`) run against [`store::fs::FsProvider`] on
//!   temporary directories.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod index;
pub mod init;
pub mod model;
pub mod scanner;
pub mod select;
pub mod store;
