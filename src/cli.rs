//! Command-line interface over a JSON deck snapshot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Detects slide groups and reorders them to match their index slides
#[derive(Parser, Debug)]
#[command(name = "deckorder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Deck snapshot (JSON) to operate on
    #[arg(short, long, global = true, default_value = "deck.json")]
    pub deck: PathBuf,

    /// Directory holding the document property store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build index slides for every content group and store the mapping
    Index {
        /// Write the modified deck back to the snapshot file
        #[arg(short, long)]
        write: bool,
    },

    /// Reorder content groups to follow the index slides
    Reorder {
        /// Write the modified deck back to the snapshot file
        #[arg(short, long)]
        write: bool,

        /// Plan the moves without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show detected index slides, groups and the stored mapping
    Inspect,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
