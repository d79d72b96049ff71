use super::render;
use super::setup::{Cli, Commands};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use mdvault::index::{OpenOutcome, SaveOutcome, VaultIndex};
use mdvault::init::{initialize, VaultContext};
use mdvault::select::Selection;
use mdvault::store::fs::FsProvider;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::debug;

pub async fn run(cli: Cli) -> Result<()> {
    let vault = match cli.vault {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let VaultContext { index, .. } = initialize(Some(vault.clone()));

    match index.open_vault().await? {
        OpenOutcome::Opened(report) => {
            debug!(notes = report.notes, folders = report.folders, "vault opened");
            eprint!("{}", render::render_warnings(&report.warnings));
        }
        OpenOutcome::Cancelled => bail!("No vault directory at {}", vault.display()),
    }

    let json = cli.json;
    match cli.command.unwrap_or(Commands::List {
        folder: None,
        search: None,
    }) {
        Commands::List { folder, search } => list(&index, folder, search, json),
        Commands::Tree => tree(&index, json),
        Commands::Show { path } => show(&index, &path, json),
        Commands::New { name, folder } => new(&index, &name, folder, json).await,
        Commands::Save { path, file } => save(&index, &path, file, json).await,
    }
}

fn list(
    index: &VaultIndex<FsProvider>,
    folder: Option<String>,
    search: Option<String>,
    json: bool,
) -> Result<()> {
    let state = index.snapshot();
    if let Some(folder) = folder.as_deref() {
        if state.folder(folder).is_none() {
            bail!("Folder not found: {}", folder);
        }
    }
    let selection = Selection {
        folder,
        note: None,
        search: search.unwrap_or_default(),
    };
    let visible = selection.visible(&state.notes);

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        print!("{}", render::render_list(&visible, Utc::now()));
    }
    Ok(())
}

fn tree(index: &VaultIndex<FsProvider>, json: bool) -> Result<()> {
    let state = index.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.folder_tree)?);
    } else {
        let name = state.vault_name.as_deref().unwrap_or("vault");
        print!(
            "{}",
            render::render_tree(name, state.total_notes(), &state.folder_tree, state.counts_stale)
        );
    }
    Ok(())
}

fn show(index: &VaultIndex<FsProvider>, path: &str, json: bool) -> Result<()> {
    let state = index.snapshot();
    let note = state
        .note(path)
        .with_context(|| format!("Note not found: {}", path))?;
    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        print!("{}", render::render_note(note, Utc::now()));
    }
    Ok(())
}

async fn new(
    index: &VaultIndex<FsProvider>,
    name: &str,
    folder: Option<String>,
    json: bool,
) -> Result<()> {
    let note = index
        .create_note_in(folder.as_deref().unwrap_or(""), name)
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print!("{}", render::render_success(&format!("Created {}", note.path)));
    }
    Ok(())
}

async fn save(
    index: &VaultIndex<FsProvider>,
    path: &str,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let content = match file {
        Some(file) => tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    match index.save_note_at(path, &content).await? {
        SaveOutcome::Updated(note) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
            } else {
                print!("{}", render::render_success(&format!("Saved {}", note.path)));
            }
        }
        SaveOutcome::Detached => {
            eprintln!("Saved {}, but it is no longer part of the vault", path);
        }
    }
    Ok(())
}
