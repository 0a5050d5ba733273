pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::sync::ViewKind;

#[derive(Parser)]
#[command(name = "storywatch")]
#[command(about = "Track new and updated stories on a forum listing", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/storywatch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape listing pages until the first already known story
    Sync {
        /// Visit at most this many pages
        #[arg(short, long)]
        pages: Option<u32>,
        /// Keep going past known stories
        #[arg(long)]
        full: bool,
    },
    /// Scrape a single listing page
    Scrape {
        /// Page number, starting at 1
        #[arg(default_value_t = 1)]
        page: u32,
        /// Report every story on the page, not only new ones
        #[arg(long)]
        all: bool,
    },
    /// Re-read a story's own page
    Refresh { id: i64 },
    /// Print the number of listing pages
    Pages,
    /// Add a story to the watch list
    Watch {
        id: i64,
        /// Clear the stored marker so the story shows as changed
        #[arg(long)]
        reset: bool,
    },
    /// Add a story to the ignore list
    Ignore {
        id: i64,
        /// Clear the stored marker
        #[arg(long)]
        reset: bool,
    },
    /// Mark the latest update of a classified story as seen
    Ack { id: i64 },
    /// Rename a classified story
    SetTitle { id: i64, title: String },
    /// Set or clear (when omitted) the priority of a classified story
    SetPriority {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        priority: Option<f64>,
    },
    /// Set or clear (when omitted) the note on a classified story
    SetDescription { id: i64, description: Option<String> },
    /// Set or clear (when omitted) the update marker of a classified story
    SetMarker { id: i64, marker: Option<String> },
    /// Print one of the views
    Show {
        #[arg(value_enum, default_value_t = ViewKind::Watch)]
        view: ViewKind,
    },
    /// Open a story in the browser
    Open { id: i64 },
}
