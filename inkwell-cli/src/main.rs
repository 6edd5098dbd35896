//! # inkwell CLI
//!
//! Command-line interface for the inkwell static blog generator.

mod commands;
mod rebuild;
mod server;

use clap::{Parser, Subcommand};
use server::ServeMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = inkwell_core::config::CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new inkwell blog
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build,

    /// Start the development server with live reload
    Dev {
        /// Server port (defaults to the configured port for the mode)
        #[arg(long)]
        port: Option<u16>,

        /// Serving mode; production serves the existing build without watching
        #[arg(long, value_enum, env = "INKWELL_MODE", default_value_t = ServeMode::Development)]
        mode: ServeMode,

        /// Open the site in a browser once the server is listening
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build => commands::build_site(&cli.config),
        Commands::Dev { port, mode, open } => {
            commands::dev_server(&cli.config, commands::DevOptions { port, mode, open }).await
        }
    }
}
