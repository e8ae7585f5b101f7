//! Unified CLI for Statement Relay
//!
//! This is the main binary that provides both server and convert modes
//! through a unified command-line interface using subcommands.
//!
//! # Usage
//!
//! ## Server Mode
//! ```bash
//! statement-relay server --port 8279 --host 0.0.0.0
//! ```
//!
//! ## Convert Mode
//! ```bash
//! statement-relay --input statement.pdf --output statement.csv
//! ```
//!
//! ## Help and Version
//! ```bash
//! statement-relay --version
//! statement-relay --help
//! statement-relay server --help
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use statement_relay::cli::{
    convert::{ConvertArgs, run_convert_mode},
    server::{ServerArgs, run_server_mode},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "statement-relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    // Convert mode options (when no subcommand is provided)
    /// PDF statement to convert
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Where to write the CSV (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server mode
    Server {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Configuration file path
        #[arg(long)]
        config: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Server {
            port,
            host,
            config,
            verbose,
        }) => {
            let args = ServerArgs {
                port,
                host,
                config,
                verbose,
            };
            run_server_mode(args).await
        }
        None => {
            let args = ConvertArgs {
                input: cli.input,
                output: cli.output,
                config: cli.config,
                verbose: cli.verbose,
            };
            run_convert_mode(args).await
        }
    }
}
