use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mdv",
    bin_name = "mdv",
    version,
    disable_help_subcommand = true,
    about = "Browse and edit a local vault of Markdown notes",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Vault directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub vault: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help_heading = "Options")]
    pub verbose: u8,

    /// Print machine-readable JSON instead of styled text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List notes, most recently modified first
    #[command(alias = "ls")]
    List {
        /// Only notes inside this folder (descendants included)
        #[arg(long, short)]
        folder: Option<String>,

        /// Case-insensitive text matched against name and content
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Show the folder tree with note counts
    Tree,

    /// Print a note's content
    #[command(alias = "cat")]
    Show {
        /// Vault-relative path, e.g. "folder1/b.md"
        path: String,
    },

    /// Create a note from the configured template
    New {
        /// File name; the note extension is appended when missing
        name: String,

        /// Folder to create the note in
        #[arg(long, short)]
        folder: Option<String>,
    },

    /// Replace a note's content from a file or stdin
    Save {
        /// Vault-relative path of an existing note
        path: String,

        /// Read content from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mdv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_list_filters() {
        let cli = parse(&["list", "--folder", "work", "-s", "todo"]);
        assert_eq!(
            cli.command,
            Some(Commands::List {
                folder: Some("work".to_string()),
                search: Some("todo".to_string()),
            })
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["new", "idea", "--vault", "/tmp/v", "-vv", "--json"]);
        assert_eq!(cli.vault, Some(PathBuf::from("/tmp/v")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
    }

    #[test]
    fn test_save_requires_path() {
        assert!(Cli::try_parse_from(["mdv", "save"]).is_err());
    }
}
