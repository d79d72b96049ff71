#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Vault {
    dir: TempDir,
    config: TempDir,
}

impl Vault {
    /// `a.md`, `folder1/b.md`, `folder1/sub/c.md`.
    fn sample() -> Self {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "# Alpha\nfirst note\n");
        write(dir.path(), "folder1/b.md", "# Bravo\nshopping list\n");
        write(dir.path(), "folder1/sub/c.md", "# Charlie\n");
        write(dir.path(), "folder1/image.png", "not a note");
        Self {
            dir,
            config: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn mdv(&self) -> Command {
        let mut cmd = Command::new(cargo_bin("mdv"));
        cmd.env("MDVAULT_CONFIG_DIR", self.config.path())
            .env_remove("RUST_LOG")
            .arg("--vault")
            .arg(self.path());
        cmd
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_list_shows_every_note() {
    let vault = Vault::sample();
    vault
        .mdv()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha"))
        .stdout(predicate::str::contains("folder1/b.md"))
        .stdout(predicate::str::contains("folder1/sub/c.md"))
        .stdout(predicate::str::contains("image.png").not());
}

#[test]
fn test_no_subcommand_defaults_to_list() {
    let vault = Vault::sample();
    vault
        .mdv()
        .assert()
        .success()
        .stdout(predicate::str::contains("Charlie"));
}

#[test]
fn test_list_filters_by_folder_and_search() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["list", "--folder", "folder1", "--search", "SHOPPING"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bravo"))
        .stdout(predicate::str::contains("Charlie").not());
}

#[test]
fn test_list_unknown_folder_fails() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["list", "--folder", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Folder not found"));
}

#[test]
fn test_tree_prints_counts() {
    let vault = Vault::sample();
    vault
        .mdv()
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("(3)"))
        .stdout(predicate::str::contains("folder1/ (2)"))
        .stdout(predicate::str::contains("sub/ (1)"));
}

#[test]
fn test_tree_json_is_tagged() {
    let vault = Vault::sample();
    let output = vault.mdv().args(["tree", "--json"]).output().unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree[0]["type"], "folder");
    assert_eq!(tree[0]["path"], "folder1");
    assert_eq!(tree[0]["note_count"], 2);
    assert_eq!(tree[0]["children"][0]["note_count"], 1);
}

#[test]
fn test_show_prints_content() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["show", "folder1/b.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shopping list"));

    vault
        .mdv()
        .args(["show", "missing.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Note not found"));
}

#[test]
fn test_new_creates_file_from_template() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["new", "ideas", "--folder", "folder1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created folder1/ideas.md"));

    let on_disk = fs::read_to_string(vault.path().join("folder1/ideas.md")).unwrap();
    assert_eq!(on_disk, "# New Note\n\n");
}

#[test]
fn test_new_refuses_existing_note() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["new", "a.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let on_disk = fs::read_to_string(vault.path().join("a.md")).unwrap();
    assert_eq!(on_disk, "# Alpha\nfirst note\n");
}

#[test]
fn test_vault_config_changes_template() {
    let vault = Vault::sample();
    write(
        vault.path(),
        "mdvault.toml",
        "new_note_template = \"# Draft\\n\"\n",
    );
    vault.mdv().args(["new", "draft"]).assert().success();

    let on_disk = fs::read_to_string(vault.path().join("draft.md")).unwrap();
    assert_eq!(on_disk, "# Draft\n");
}

#[test]
fn test_save_from_stdin() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["save", "a.md"])
        .write_stdin("# Alpha\nrewritten\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved a.md"));

    let on_disk = fs::read_to_string(vault.path().join("a.md")).unwrap();
    assert_eq!(on_disk, "# Alpha\nrewritten\n");
}

#[test]
fn test_save_from_file() {
    let vault = Vault::sample();
    let source = vault.config.path().join("draft.txt");
    fs::write(&source, "from a file").unwrap();

    vault
        .mdv()
        .args(["save", "folder1/sub/c.md", "--file"])
        .arg(&source)
        .assert()
        .success();

    let on_disk = fs::read_to_string(vault.path().join("folder1/sub/c.md")).unwrap();
    assert_eq!(on_disk, "from a file");
}

#[test]
fn test_save_unknown_note_fails_without_writing() {
    let vault = Vault::sample();
    vault
        .mdv()
        .args(["save", "ghost.md"])
        .write_stdin("boo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Note not found"));
    assert!(!vault.path().join("ghost.md").exists());
}

#[test]
fn test_missing_vault_directory_fails() {
    let temp = TempDir::new().unwrap();
    Command::new(cargo_bin("mdv"))
        .env("MDVAULT_CONFIG_DIR", temp.path())
        .arg("--vault")
        .arg(temp.path().join("does-not-exist"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}
