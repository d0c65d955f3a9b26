//! CLI module for Scrub.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Scrub - Chat with a video
///
/// Ingest a video once, then ask questions whose answers cite [MM:SS]
/// timestamps you can jump to.
#[derive(Parser, Debug)]
#[command(name = "scrub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SCRUB_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed one or more videos (skips videos already stored)
    Ingest {
        /// Video IDs
        #[arg(required = true)]
        video_ids: Vec<String>,

        /// Maximum number of videos analyzed at once
        #[arg(short = 'j', long, default_value = "2")]
        concurrency: usize,
    },

    /// Ask a single question about a video
    Ask {
        /// Video ID
        video_id: String,

        /// The question to ask
        question: String,

        /// Number of chunks to retrieve (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start an interactive chat about a video
    Chat {
        /// Video ID
        video_id: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List stored videos
    List,

    /// Delete a video's stored chunks so it can be ingested again
    Forget {
        /// Video ID
        video_id: String,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
