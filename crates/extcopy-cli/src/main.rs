#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use extcopy_core::{Config, Platform};
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "extcopy")]
#[command(author, version, about = "Copy external node modules next to a server bundle", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (relative output paths are taken against it)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Copy external modules imported by the entry files into the output directory
    Copy {
        /// Entry files to scan for imports
        #[arg(required = true)]
        entries: Vec<PathBuf>,

        /// Module names to treat as external (comma separated or repeated)
        #[arg(long = "external", value_delimiter = ',', required = true)]
        externals: Vec<String>,

        /// Output directory of the bundle
        #[arg(long, conflicts_with = "outfile")]
        outdir: Option<PathBuf>,

        /// Output file of the bundle (its directory receives node_modules)
        #[arg(long)]
        outfile: Option<PathBuf>,

        /// Target platform
        #[arg(long, default_value = "node")]
        platform: Platform,

        /// Treat the build as unbundled (disables copying)
        #[arg(long)]
        no_bundle: bool,

        /// Report what would be copied without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    match cli.command {
        None | Some(Commands::Version) => commands::version::run(),
        Some(Commands::Copy {
            entries,
            externals,
            outdir,
            outfile,
            platform,
            no_bundle,
            dry_run,
        }) => {
            logging::init(config.verbosity, config.json_logs);

            let action = commands::copy::CopyAction {
                cwd: config.cwd.clone(),
                entries,
                externals,
                outdir,
                outfile,
                platform,
                bundle: !no_bundle,
                dry_run,
            };
            commands::copy::run(action, cli.json)
        }
    }
}
