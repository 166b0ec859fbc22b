//! jmage CLI - The `jmz` command.
//!
//! Checks, summarizes and converts SFZ/JMZ patch files using `jmage-sfz`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jmage_sfz::{ParseOptions, Variant};
use std::path::PathBuf;

/// jmage patch tool
#[derive(Parser, Debug)]
#[command(name = "jmz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check and convert SFZ/JMZ sampler patches", long_about = None)]
struct Args {
    /// Parse input as this format instead of guessing from the extension
    #[arg(long, global = true, value_name = "sfz|jmz")]
    format: Option<Variant>,

    /// TOML file with parse options
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a patch and report warnings
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print one summary line per region
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Convert a patch, choosing the output format from OUTPUT's extension
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = match &args.config {
        Some(path) => ParseOptions::load(path)?,
        None => ParseOptions::default(),
    };

    let stdout = &mut std::io::stdout().lock();
    match args.command {
        Commands::Check { file } => commands::check(stdout, &file, args.format, &options),
        Commands::Dump { file } => commands::dump(stdout, &file, args.format, &options),
        Commands::Convert { input, output } => {
            commands::convert(stdout, &input, &output, args.format, &options)
        }
    }
}
