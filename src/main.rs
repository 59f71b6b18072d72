//! # voltcycle
//!
//! Command-line front end for the `voltcycle` library.
//!
//! ## Usage
//!
//! ```bash
//! # Per-cycle table from a folder of Gamry files
//! voltcycle summary --folder cell_01/CHARGE_DISCHARGE --extension DTA
//!
//! # Rate experiment from a Biologic battery module
//! voltcycle rate rate_test.mpt --source biologic-module
//!
//! # Export the per-cycle summary
//! voltcycle export cycling.mpt --output cycles.csv
//!
//! # Inspect a voltammogram
//! voltcycle cv ferrocene.DTA
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
