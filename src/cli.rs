use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wallpaper_provider::prelude::SourceType;

/// Command-line front end to the wallpaper provider
#[derive(Parser)]
#[command(name = "wallpaper-provider")]
#[command(about = "Inspect and manage wallpaper sources", long_about = None)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preference database URL (defaults to a SQLite file in the data directory)
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the aggregated wallpaper list
    Wallpapers {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Manage custom sources
    Sources {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Toggle the Bing image of the day
    Bing {
        #[command(subcommand)]
        action: BingAction,
    },
    /// Export or import all preferences as JSON
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Resolve a YouTube, Rutube or playlist link to a playable stream URL
    Resolve {
        url: String,
    },
}

#[derive(Subcommand)]
pub enum SourceAction {
    /// List stored sources
    List,
    /// Add a source
    Add {
        title: String,
        url: String,
        #[arg(short = 't', long = "type", default_value = "image")]
        source_type: SourceType,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        thumbnail: String,
        /// Resolve a YouTube or Rutube page link to its stream before storing
        #[arg(long)]
        resolve: bool,
    },
    /// Re-extract stream URLs that have expired
    Refresh,
    /// Remove a source by id
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BingAction {
    On,
    Off,
    Status,
}

#[derive(Subcommand)]
pub enum PrefsAction {
    Export,
    /// Import from a file, or stdin when omitted
    Import {
        file: Option<PathBuf>,
    },
}
