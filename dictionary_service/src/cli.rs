//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dictionary service
#[derive(Parser)]
#[command(name = "dictionary-server")]
#[command(about = "In-memory word/definition dictionary over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (HOST:PORT), overrides the configured one
        #[arg(long)]
        addr: Option<String>,
        /// Dictionary file loaded at startup and written at shutdown
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
    /// Print the entries stored in a dictionary file
    Inspect {
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
}
