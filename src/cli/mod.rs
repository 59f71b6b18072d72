use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod config;
mod cv;
mod export;
mod output;
mod rate;
mod summary;

/// voltcycle - Electrochemical cycle reconstruction
#[derive(Parser)]
#[command(name = "voltcycle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Source layout of a rate experiment.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RateSource {
    /// Biologic battery-module `.mpt` file
    BiologicModule,
    /// Delimited per-cycle summary table
    RateTable,
    /// Gamry base / step / CHARGE_DISCHARGE folder tree
    GamryTree,
}

/// Export file format.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Pretty-printed JSON
    Json,
}

/// Input files shared by the cycling subcommands.
#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Data files, fetched as one batch
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Fetch every matching file of a folder
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,

    /// Extension filter for --folder
    #[arg(long, default_value = "DTA")]
    extension: String,

    /// Load ingestion settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail if any file fails to parse
    #[arg(long)]
    all_or_nothing: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a per-cycle table of capacities and efficiencies
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the series of a rate experiment
    Rate {
        /// Battery-module file, summary table or tree base folder
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Layout of PATH
        #[arg(short, long, value_enum)]
        source: RateSource,

        /// Load ingestion settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write the per-cycle summary to a file
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "csv", value_enum)]
        format: ExportFormat,
    },

    /// Print the cycles and potential window of a cyclic voltammogram
    Cv {
        /// Voltammetry file (.DTA, .mpt or .txt)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Summary { input } => summary::run(input),
        Commands::Rate { path, source, config } => rate::run(path, source, config),
        Commands::Export { input, output, format } => export::run(input, output, format),
        Commands::Cv { file } => cv::run(file),
    }
}
