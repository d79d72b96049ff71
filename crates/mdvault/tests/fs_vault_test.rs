use mdvault::config::VaultConfig;
use mdvault::error::VaultError;
use mdvault::index::{OpenOutcome, SaveOutcome, VaultIndex};
use mdvault::model::TreeMode;
use mdvault::select::Selection;
use mdvault::store::fs::FsProvider;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write_note(root: &Path, rel: &str, content: &str, secs: u64) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

/// `a.md` (t=100), `folder1/b.md` (t=200), `folder1/sub/c.md` (t=50).
fn sample_vault() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "a.md", "# A\n", 100);
    write_note(temp.path(), "folder1/b.md", "# B\n", 200);
    write_note(temp.path(), "folder1/sub/c.md", "# C\n", 50);
    temp
}

async fn open(temp: &TempDir, config: VaultConfig) -> VaultIndex<FsProvider> {
    let index = VaultIndex::new(FsProvider::new(Some(temp.path().to_path_buf())), config);
    match index.open_vault().await.unwrap() {
        OpenOutcome::Opened(_) => index,
        OpenOutcome::Cancelled => panic!("vault open was cancelled"),
    }
}

#[tokio::test]
async fn test_sample_vault_loads_in_recency_order() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;
    let state = index.snapshot();

    let names: Vec<_> = state.notes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["b.md", "a.md", "c.md"]);

    assert_eq!(state.folder_tree.len(), 1);
    let folder1 = state.folder("folder1").unwrap();
    assert_eq!(folder1.note_count, 2);
    assert_eq!(folder1.children.len(), 1);
    assert_eq!(state.folder("folder1/sub").unwrap().note_count, 1);
    assert_eq!(
        state.vault_name.as_deref(),
        temp.path().file_name().and_then(|n| n.to_str())
    );
}

#[tokio::test]
async fn test_non_markdown_files_are_ignored() {
    let temp = sample_vault();
    write_note(temp.path(), "image.png", "binary-ish", 10);
    write_note(temp.path(), "folder1/NOTES.MD", "upper", 10);
    write_note(temp.path(), "attachments/deep/only.md", "# deep", 10);

    let index = open(&temp, VaultConfig::default()).await;
    let state = index.snapshot();
    assert_eq!(state.total_notes(), 4);
    assert!(state.note("folder1/NOTES.MD").is_none());
    assert_eq!(state.folder("attachments").unwrap().note_count, 1);
}

#[tokio::test]
async fn test_rescan_of_unchanged_vault_is_identical() {
    let temp = sample_vault();
    fs::create_dir_all(temp.path().join("Zeta")).unwrap();
    fs::create_dir_all(temp.path().join("alpha")).unwrap();
    let index = open(&temp, VaultConfig::default()).await;
    let first = index.snapshot();

    index.refresh().await.unwrap();
    let second = index.snapshot();
    assert_eq!(first.folder_tree, second.folder_tree);
    assert_eq!(first.notes, second.notes);

    let top: Vec<_> = second.folder_tree.iter().map(|f| f.name()).collect();
    assert_eq!(top, vec!["Zeta", "alpha", "folder1"]);
}

#[tokio::test]
async fn test_create_then_save_round_trip_on_disk() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;

    let note = index.create_note_in("folder1", "todo").await.unwrap();
    assert_eq!(note.path, "folder1/todo.md");
    let on_disk = fs::read_to_string(temp.path().join("folder1/todo.md")).unwrap();
    assert_eq!(on_disk, "# New Note\n\n");
    assert_eq!(index.snapshot().notes[0].path, "folder1/todo.md");

    let outcome = index.save_note(note.storage_ref(), "# Todo\n- ship").await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Updated(_)));
    let on_disk = fs::read_to_string(temp.path().join("folder1/todo.md")).unwrap();
    assert_eq!(on_disk, "# Todo\n- ship");

    index.refresh().await.unwrap();
    let state = index.snapshot();
    assert_eq!(state.note("folder1/todo.md").unwrap().content, "# Todo\n- ship");
    assert_eq!(state.folder("folder1").unwrap().note_count, 3);
}

#[tokio::test]
async fn test_create_never_clobbers_existing_file() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;
    write_note(temp.path(), "late.md", "written after load", 300);

    let err = index.create_note("late.md").await.unwrap_err();
    assert!(matches!(err, VaultError::NoteExists(_)));
    let on_disk = fs::read_to_string(temp.path().join("late.md")).unwrap();
    assert_eq!(on_disk, "written after load");
}

#[tokio::test]
async fn test_externally_deleted_note_disappears_on_refresh() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;
    let file = index.snapshot().note("a.md").unwrap().storage_ref();

    fs::remove_file(temp.path().join("a.md")).unwrap();
    index.refresh().await.unwrap();

    assert!(index.snapshot().note("a.md").is_none());
    let err = index.save_note(file, "resurrect").await.unwrap_err();
    assert!(matches!(err, VaultError::NoteNotFound(_)));
    assert!(!temp.path().join("a.md").exists());
}

#[tokio::test]
async fn test_deleted_root_fails_refresh_and_keeps_state() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;
    let before = index.snapshot();

    let root = temp.path().to_path_buf();
    drop(temp);
    assert!(!root.exists());

    let err = index.refresh().await.unwrap_err();
    assert!(matches!(err, VaultError::Scan(_)));
    let after = index.snapshot();
    assert_eq!(after.notes, before.notes);
    assert_eq!(after.folder_tree, before.folder_tree);
    assert!(!after.is_loading);
}

#[tokio::test]
async fn test_notes_tree_mode_lists_leaves() {
    let temp = sample_vault();
    let config = VaultConfig {
        tree_mode: TreeMode::Notes,
        ..VaultConfig::default()
    };
    let index = open(&temp, config).await;
    let state = index.snapshot();

    let top: Vec<_> = state.folder_tree.iter().map(|f| f.name()).collect();
    assert_eq!(top, vec!["folder1", "a.md"]);
    assert_eq!(state.folder_tree[1].note_count(), None);
    assert_eq!(state.folder("folder1").unwrap().note_count, 2);
}

#[tokio::test]
async fn test_selection_matches_folder_counts() {
    let temp = sample_vault();
    let index = open(&temp, VaultConfig::default()).await;
    let state = index.snapshot();

    for path in ["folder1", "folder1/sub"] {
        let visible = Selection::in_folder(path).visible(&state.notes);
        assert_eq!(visible.len(), state.folder(path).unwrap().note_count);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_file_is_skipped_with_warning() {
    use std::os::unix::fs::PermissionsExt;

    let temp = sample_vault();
    let locked = temp.path().join("folder1/b.md");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_to_string(&locked).is_ok() {
        // Running as root: permissions are not enforced.
        return;
    }

    let index = open(&temp, VaultConfig::default()).await;
    let state = index.snapshot();
    assert_eq!(state.total_notes(), 2);
    assert_eq!(state.warnings.len(), 1);
    assert_eq!(state.warnings[0].path, "folder1/b.md");

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
