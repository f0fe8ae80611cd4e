//! Stitch CLI - builds static sites from content and templates.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "stitch")]
#[command(about = "Static site builder: content plus templates in, a ready-to-upload site out")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Site folder to build when no command is given
    folder: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into its output folder
    Build {
        /// Site folder holding content/ and templates/
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Build, serve and rebuild on every change
    Dev {
        /// Site folder holding content/ and templates/
        #[arg(default_value = ".")]
        folder: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "8008")]
        port: u16,

        /// Open the site in a browser
        #[arg(long)]
        open: bool,
    },

    /// Build, then upload the output folder over FTP
    Publish {
        /// Site folder holding content/ and templates/
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Print name, version and license
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let command = cli.command.unwrap_or(Commands::Build {
        folder: cli.folder.unwrap_or_else(|| PathBuf::from(".")),
    });

    // Execute command
    match command {
        Commands::Build { folder } => {
            commands::build::run(&folder).await?;
        }
        Commands::Dev { folder, port, open } => {
            commands::dev::run(&folder, port, open).await?;
        }
        Commands::Publish { folder } => {
            commands::publish::run(&folder).await?;
        }
        Commands::Info => {
            commands::info::run();
        }
    }

    Ok(())
}
