//! NanoPost CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod pipeline;

#[derive(Parser)]
#[command(name = "nanopost")]
#[command(about = "NanoPost - NanoAOD post-processing modules")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a module pipeline over an events file
    Run {
        /// Pipeline spec (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Input events (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for processed rows (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Run { spec, input, output } => {
            pipeline::cmd_run(&spec, &input, output.as_deref())
        }
        Commands::Version => {
            println!("nanopost {}", np_core::VERSION);
            Ok(())
        }
    }
}
