//! # voltcycle - Electrochemical cycle reconstruction
//!
//! `voltcycle` reads raw instrument output from cell-cycling and cyclic-voltammetry
//! experiments and rebuilds charge/discharge cycles from it. From those cycles it
//! computes charge, energy, efficiencies and capacity retention.
//!
//! ## Key Features
//!
//! - **Heterogeneous inputs**: Gamry `.DTA` single half-cycle files, Biologic `.mpt`
//!   cycling and battery-module files, delimited rate-test summary tables, and the
//!   standardized Gamry folder tree grouped by current step.
//!
//! - **Locale tolerance**: comma-decimal files parse to exactly the same values as
//!   their dot-decimal counterparts.
//!
//! - **One sign convention**: every record is sign-normalized on ingestion, so
//!   charge integrates positive and discharge negative everywhere downstream.
//!
//! - **Batch resilience**: folder ingestion reports the files that failed and keeps
//!   the rest, so partial experiments can still be analyzed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voltcycle::manager::FileManager;
//!
//! let mut manager = FileManager::new();
//! let report = manager.fetch_from_folder("cell_01/CHARGE_DISCHARGE", "DTA")?;
//! if !report.is_complete() {
//!     eprintln!("{}", report);
//! }
//!
//! let cycling = manager.build_cellcycling()?;
//! for (cycle, retention) in cycling.iter().zip(cycling.capacity_retention()) {
//!     println!(
//!         "cycle {}: {:?} mAh, CE {:?}, retention {:?}",
//!         cycle.number(),
//!         cycle.capacity_discharge(),
//!         cycle.coulomb_efficiency(),
//!         retention
//!     );
//! }
//! # Ok::<(), voltcycle::manager::ManagerError>(())
//! ```
//!
//! ## Rate experiments
//!
//! ```rust,no_run
//! use voltcycle::cycles::Units;
//! use voltcycle::experiment::RateExperiment;
//!
//! let rate = RateExperiment::from_biologic_battery_module("rate_test.mpt", Units::default())?;
//! println!("{}", rate);
//! # Ok::<(), voltcycle::experiment::RateError>(())
//! ```
//!
//! ## Modules
//!
//! - [`formats`]: instrument parsers producing normalized raw half-cycle records
//! - [`manager`]: ingestion sessions, ordering and charge/discharge pairing
//! - [`cycles`]: half-cycles, cycles and cycling sequences with derived quantities
//! - [`experiment`]: cross-step rate-capability aggregation
//! - [`voltammetry`]: cyclic-voltammetry reader

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycles;
pub mod experiment;
pub mod formats;
pub mod manager;
pub mod voltammetry;

#[cfg(test)]
mod test_fixtures;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cycles::{CellCycling, ChargeUnit, Cycle, CycleError, EnergyUnit, HalfCycle, Units};
    pub use crate::experiment::{RateError, RateExperiment, RatePoint, RateStep};
    pub use crate::formats::{
        parse_bytes, parse_file, Branch, FormatError, Instrument, ParseOptions, ParsedContent, ParsedFile,
        RawHalfCycle, SourceInfo,
    };
    pub use crate::manager::{FetchOrder, FetchReport, FileManager, ManagerConfig, ManagerError};
    pub use crate::voltammetry::{CvFormat, CyclicVoltammetry};
}
