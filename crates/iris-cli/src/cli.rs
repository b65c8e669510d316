use std::path::PathBuf;

use clap::{Parser, Subcommand};
use iris_core::Notation;

/// Iris diagram client
#[derive(Parser, Debug)]
#[command(name = "iris")]
#[command(about = "Work with Iris architecture diagrams from the command line")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file, applied over ./iris.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "IRIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the session on the server and forget it locally
    Logout,
    /// Show the logged-in user and when the access token expires
    Whoami,
    /// List entity and relationship kinds per notation
    Notations {
        /// Only this notation (simple, uml, archimate, sequence)
        notation: Option<Notation>,
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON schema of a model version document
    Schema,
    /// Convert a canvas file ({"nodes": [...], "edges": [...]}) to a model
    /// version document
    BuildVersion { canvas: PathBuf },
    /// Save a canvas file as the next version of a model
    SaveVersion {
        #[arg(short, long)]
        model: String,
        canvas: PathBuf,
        #[arg(short, long)]
        summary: Option<String>,
    },
    /// List models
    Models {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        page_size: u32,
    },
    /// List the saved versions of a model
    Versions { model: String },
}
