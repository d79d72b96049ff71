//! # Vault Index
//!
//! [`VaultIndex`] owns the authoritative in-memory model of an open vault and is
//! the only component that talks to the [`StorageProvider`] on behalf of the UI.
//!
//! ## State Machine
//!
//! ```text
//!   Empty ──open_vault──▶ Open ──refresh──▶ Open
//!                          │
//!                          └─create_note / save_note (in-place reconciliation)
//! ```
//!
//! There is no way back to `Empty`: closing a vault is not an operation.
//!
//! ## Publishing
//!
//! State lives in a [`tokio::sync::watch`] channel. Every change is one
//! `send_modify`/`send_if_modified` call, so an observer holding a
//! [`VaultState`] snapshot never sees notes from one load next to a folder
//! tree from another.
//!
//! ## Loads
//!
//! A load walks the root with the [`scanner`], sorts notes by recency, assigns
//! folder counts and publishes the result in one step. Loads are single-flight
//! per root: a refresh issued while a load is running attaches to that load and
//! receives its result instead of starting a second walk. A failed load leaves
//! the published notes and tree untouched; `is_loading` returns to `false` on
//! success, failure, and when the leading caller drops its future.
//!
//! ## Local Mutations
//!
//! Creating or saving a note never triggers a rescan:
//!
//! - **Create** prepends the new note (it is the most recent) and marks folder
//!   counts stale. Counts are recomputed by the next load.
//! - **Save** finds the note by its [`FileRef`], never by position, so a load
//!   that replaced `notes` while the write was in flight cannot redirect the
//!   update. If the note vanished in the meantime the update is dropped.
//!
//! Nothing changes in memory unless the storage write succeeded. Storage
//! writes are serialized, so two saves of one note land in memory in the same
//! order as on storage.
//!
//! A mutation applied while a load is running is also journaled. The scan may
//! have read the file before the write, so when the load publishes, every
//! journaled note replaces its scanned counterpart (matched by [`FileRef`])
//! unless storage reports a newer modification. A created note the scan never
//! saw is re-inserted and folder counts stay marked stale.

use crate::aggregate;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::model::{find_folder, join_path, sort_by_recency, FolderItem, FolderNode, Note};
use crate::scanner::{self, ScanOutput, ScanWarning};
use crate::store::{check_entry_name, DirRef, FileRef, StorageProvider};
use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{watch, Mutex as TokioMutex};
use tracing::{debug, info, warn};

/// Snapshot of everything the index publishes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VaultState {
    #[serde(skip)]
    pub root: Option<DirRef>,
    /// Display name of the open vault ("Connected to …").
    pub vault_name: Option<String>,
    /// Most recently modified first.
    pub notes: Vec<Note>,
    pub folder_tree: Vec<FolderItem>,
    pub is_loading: bool,
    /// Set by `create_note`; folder counts lag until the next load.
    pub counts_stale: bool,
    /// Entries the last successful load had to skip.
    pub warnings: Vec<ScanWarning>,
    /// Number of successful loads so far.
    pub generation: u64,
    #[serde(skip)]
    folder_refs: HashMap<String, DirRef>,
    #[serde(skip)]
    journal: Vec<Mutation>,
}

/// A create or save applied while a load was running.
#[derive(Debug, Clone)]
struct Mutation {
    note: Note,
    created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultPhase {
    Empty,
    Open,
}

impl VaultState {
    pub fn phase(&self) -> VaultPhase {
        if self.root.is_some() {
            VaultPhase::Open
        } else {
            VaultPhase::Empty
        }
    }

    pub fn is_open(&self) -> bool {
        self.root.is_some()
    }

    pub fn total_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn note(&self, path: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.path == path)
    }

    pub fn folder(&self, path: &str) -> Option<&FolderNode> {
        find_folder(&self.folder_tree, path)
    }

    fn record(&mut self, note: &Note, created: bool) {
        if self.is_loading {
            self.journal.push(Mutation {
                note: note.clone(),
                created,
            });
        }
    }

    /// Set `is_loading`; the journal is dropped once no load is running.
    fn settle(&mut self, still_loading: bool) -> bool {
        let changed = self.is_loading != still_loading;
        self.is_loading = still_loading;
        if !still_loading {
            self.journal.clear();
        }
        changed
    }
}

/// Summary of a completed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub notes: usize,
    pub folders: usize,
    pub warnings: Vec<ScanWarning>,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(LoadReport),
    /// The picker was dismissed. Not an error.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Updated(Note),
    /// Written to storage, but the note was no longer in the index.
    Detached,
}

type LoadSlot = watch::Receiver<Option<Result<LoadReport>>>;

enum Role {
    Leader(watch::Sender<Option<Result<LoadReport>>>),
    Follower(LoadSlot),
}

pub struct VaultIndex<P: StorageProvider> {
    provider: P,
    config: VaultConfig,
    state: watch::Sender<VaultState>,
    in_flight: Mutex<HashMap<DirRef, LoadSlot>>,
    writes: TokioMutex<()>,
}

impl<P: StorageProvider> VaultIndex<P> {
    pub fn new(provider: P, config: VaultConfig) -> Self {
        let (state, _) = watch::channel(VaultState::default());
        Self {
            provider,
            config,
            state,
            in_flight: Mutex::new(HashMap::new()),
            writes: TokioMutex::new(()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Current published state.
    pub fn snapshot(&self) -> VaultState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<VaultState> {
        self.state.subscribe()
    }

    /// Ask the provider for a root directory and load it.
    ///
    /// Opening a different root than the current one clears the previous
    /// vault's notes and tree before the load starts.
    pub async fn open_vault(&self) -> Result<OpenOutcome> {
        if !self.provider.is_supported() {
            warn!("storage provider does not support local directories");
            return Err(VaultError::Unsupported);
        }
        let Some(root) = self.provider.pick_root().await? else {
            info!("vault picker dismissed");
            return Ok(OpenOutcome::Cancelled);
        };

        info!(vault = %root.name, "opening vault");
        self.state.send_modify(|s| {
            if s.root != Some(root.dir) {
                *s = VaultState {
                    root: Some(root.dir),
                    vault_name: Some(root.name.clone()),
                    is_loading: s.is_loading,
                    generation: s.generation,
                    ..VaultState::default()
                };
            }
        });
        let report = self.load(root.dir).await?;
        Ok(OpenOutcome::Opened(report))
    }

    /// Reload the open vault. Returns `Ok(None)` when no vault is open.
    pub async fn refresh(&self) -> Result<Option<LoadReport>> {
        let root = self.state.borrow().root;
        let Some(root) = root else {
            debug!("refresh ignored, no vault open");
            return Ok(None);
        };
        self.load(root).await.map(Some)
    }

    /// Create a note at the vault root.
    pub async fn create_note(&self, name: &str) -> Result<Note> {
        self.create_note_in("", name).await
    }

    /// Create a note inside `folder` ("" for the root) from the configured template.
    ///
    /// The note extension is appended when `name` lacks it. Fails with
    /// [`VaultError::NoteExists`] rather than overwriting an existing file.
    pub async fn create_note_in(&self, folder: &str, name: &str) -> Result<Note> {
        let file_name = self.note_file_name(name)?;
        let _writing = self.writes.lock().await;
        let (root, dir, path) = {
            let state = self.state.borrow();
            let root = state.root.ok_or(VaultError::NotOpen)?;
            let dir = if folder.is_empty() {
                root
            } else {
                *state
                    .folder_refs
                    .get(folder)
                    .ok_or_else(|| VaultError::FolderNotFound(folder.to_string()))?
            };
            let path = join_path(folder, &file_name);
            if state.note(&path).is_some() {
                return Err(VaultError::NoteExists(path));
            }
            (root, dir, path)
        };

        match self.provider.open_file(dir, &file_name).await {
            Ok(_) => return Err(VaultError::NoteExists(path)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(write_error(&path, e)),
        }

        let template = self.config.new_note_template.as_str();
        let file = self
            .provider
            .create_file(dir, &file_name)
            .await
            .map_err(|e| write_error(&path, e))?;
        self.provider
            .write_file(file, template)
            .await
            .map_err(|e| write_error(&path, e))?;

        let mut created = None;
        self.state.send_if_modified(|s| {
            if s.root != Some(root) {
                return false;
            }
            let now = Utc::now();
            let stamp = s.notes.first().map_or(now, |head| now.max(head.last_modified));
            let note = Note::new(path.clone(), template.to_string(), stamp, file);
            s.notes.retain(|n| n.path != path);
            s.notes.insert(0, note.clone());
            s.counts_stale = true;
            s.record(&note, true);
            created = Some(note);
            true
        });

        match created {
            Some(note) => {
                info!(path = %note.path, "created note");
                Ok(note)
            }
            None => {
                warn!(%path, "vault changed while creating note");
                Err(VaultError::Superseded)
            }
        }
    }

    /// Write `content` to the note backed by `file` and update it in memory.
    ///
    /// The saved note becomes the most recent one and moves to the front of
    /// `notes`; every other entry keeps its content and relative order.
    pub async fn save_note(&self, file: FileRef, content: &str) -> Result<SaveOutcome> {
        let _writing = self.writes.lock().await;
        let path = {
            let state = self.state.borrow();
            if !state.is_open() {
                return Err(VaultError::NotOpen);
            }
            state
                .notes
                .iter()
                .find(|n| n.storage_ref() == file)
                .map(|n| n.path.clone())
                .ok_or_else(|| VaultError::NoteNotFound(format!("{:?}", file)))?
        };

        self.provider
            .write_file(file, content)
            .await
            .map_err(|e| write_error(&path, e))?;

        match self.apply_save(file, content) {
            Some(note) => {
                debug!(path = %note.path, "saved note");
                Ok(SaveOutcome::Updated(note))
            }
            None => {
                warn!(%path, "saved note is no longer indexed; update dropped");
                Ok(SaveOutcome::Detached)
            }
        }
    }

    /// [`Self::save_note`] addressed by vault-relative path.
    pub async fn save_note_at(&self, path: &str, content: &str) -> Result<SaveOutcome> {
        let file = self
            .state
            .borrow()
            .note(path)
            .map(Note::storage_ref)
            .ok_or_else(|| VaultError::NoteNotFound(path.to_string()))?;
        self.save_note(file, content).await
    }

    fn apply_save(&self, file: FileRef, content: &str) -> Option<Note> {
        let mut updated = None;
        self.state.send_if_modified(|s| {
            let Some(pos) = s.notes.iter().position(|n| n.storage_ref() == file) else {
                return false;
            };
            let newest = s.notes[0].last_modified;
            let mut note = s.notes.remove(pos);
            note.content = content.to_string();
            note.last_modified = Utc::now()
                .max(note.last_modified + TimeDelta::milliseconds(1))
                .max(newest);
            s.record(&note, false);
            updated = Some(note.clone());
            s.notes.insert(0, note);
            true
        });
        updated
    }

    fn note_file_name(&self, name: &str) -> Result<String> {
        let ext = self.config.note_ext();
        if name.trim().is_empty() || name == ext {
            return Err(VaultError::InvalidName(name.to_string()));
        }
        check_entry_name(name)?;
        if name.ends_with(&ext) {
            Ok(name.to_string())
        } else {
            Ok(format!("{}{}", name, ext))
        }
    }

    async fn load(&self, root: DirRef) -> Result<LoadReport> {
        let role = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&root) {
                Some(slot) => Role::Follower(slot.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(root, rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Follower(mut slot) => {
                debug!("attaching to in-flight load");
                let outcome = slot
                    .wait_for(Option::is_some)
                    .await
                    .map_err(|_| VaultError::LoadAbandoned)?;
                let outcome: Option<Result<LoadReport>> = (*outcome).clone();
                outcome.unwrap_or(Err(VaultError::LoadAbandoned))
            }
            Role::Leader(tx) => {
                let mut guard = FlightGuard {
                    index: self,
                    root,
                    armed: true,
                };
                self.state.send_if_modified(|s| !std::mem::replace(&mut s.is_loading, true));
                let scanned = self.scan_root(root).await;
                guard.armed = false;
                let still_loading = self.land(root);
                let result = self.publish(root, scanned, still_loading);
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }

    async fn scan_root(&self, root: DirRef) -> Result<ScanOutput> {
        let mut out = scanner::scan(&self.provider, root, "", &self.config.scan_options()).await?;
        sort_by_recency(&mut out.notes);
        aggregate::assign_counts(&mut out.tree, &out.notes);
        out.folders.insert(String::new(), root);
        Ok(out)
    }

    /// Remove the in-flight slot for `root`; true if other loads remain.
    fn land(&self, root: DirRef) -> bool {
        let mut in_flight = self.in_flight.lock();
        in_flight.remove(&root);
        !in_flight.is_empty()
    }

    fn publish(
        &self,
        root: DirRef,
        scanned: Result<ScanOutput>,
        still_loading: bool,
    ) -> Result<LoadReport> {
        let out = match scanned {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "vault load failed; keeping previous state");
                self.state.send_if_modified(|s| s.settle(still_loading));
                return Err(e);
            }
        };

        let mut result = Err(VaultError::Superseded);
        self.state.send_modify(|s| {
            if s.root != Some(root) {
                s.settle(still_loading);
                return;
            }
            let mut notes = out.notes;
            let journal = std::mem::take(&mut s.journal);
            if !journal.is_empty() {
                debug!(mutations = journal.len(), "replaying changes made during load");
            }
            let unscanned = replay(&mut notes, journal);
            s.settle(still_loading);
            s.generation += 1;
            let report = LoadReport {
                notes: notes.len(),
                folders: out.folders.len() - 1,
                warnings: out.warnings.clone(),
                generation: s.generation,
            };
            s.notes = notes;
            s.folder_tree = out.tree;
            s.folder_refs = out.folders;
            s.warnings = out.warnings;
            s.counts_stale = unscanned;
            result = Ok(report);
        });

        match &result {
            Ok(report) => info!(
                notes = report.notes,
                folders = report.folders,
                skipped = report.warnings.len(),
                generation = report.generation,
                "vault loaded"
            ),
            Err(_) => warn!("vault changed during load; result discarded"),
        }
        result
    }
}

/// Clears the in-flight slot if a leading load is dropped before it lands.
struct FlightGuard<'a, P: StorageProvider> {
    index: &'a VaultIndex<P>,
    root: DirRef,
    armed: bool,
}

impl<P: StorageProvider> Drop for FlightGuard<'_, P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("load abandoned before completion");
        let still_loading = self.index.land(self.root);
        self.index.state.send_if_modified(|s| s.settle(still_loading));
    }
}

/// Lay journaled notes over freshly scanned ones and restore recency order.
///
/// Returns true when a created note was missing from the scan, which leaves
/// folder counts one load behind.
fn replay(notes: &mut Vec<Note>, journal: Vec<Mutation>) -> bool {
    let mut unscanned = false;
    for Mutation { note, created } in journal {
        let file = note.storage_ref();
        match notes.iter().position(|n| n.storage_ref() == file) {
            Some(pos) if notes[pos].last_modified <= note.last_modified => notes[pos] = note,
            Some(_) => {}
            None if created => {
                notes.push(note);
                unscanned = true;
            }
            None => {}
        }
    }
    sort_by_recency(notes);
    unscanned
}

fn write_error(path: &str, err: VaultError) -> VaultError {
    warn!(%path, error = %err, "storage write failed");
    match err {
        VaultError::InvalidName(_) | VaultError::Write { .. } => err,
        other => VaultError::Write {
            path: path.to_string(),
            reason: other.to_string(),
        },
    }
}
