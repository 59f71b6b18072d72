//! # Cycle Reconstruction Module
//!
//! Derived electrochemical quantities, from one branch up to a whole experiment:
//!
//! - [`HalfCycle`]: cumulative charge, power and cumulative energy of one branch
//! - [`Cycle`]: a charge/discharge pair (or a one-sided remainder) with its
//!   coulombic, energy and voltaic efficiencies
//! - [`CellCycling`]: the ordered cycles of one experiment with capacity retention
//!
//! ## Numeric conventions
//!
//! Charge and energy are integrated with the trapezoidal rule on absolute
//! increments, so cumulative series never decrease. Efficiencies are fractions
//! (1.0 = 100 %). The voltaic efficiency is the ratio of charge-weighted mean
//! voltages `V̄ = E / Q`, which makes `η_E = η_Q · η_V` hold exactly. Degenerate
//! inputs (zero charge, one sample, zero duration) give `None`, never an error.
//!
//! ## Example
//!
//! ```rust
//! use voltcycle::cycles::{Cycle, HalfCycle};
//! use voltcycle::formats::{Branch, Instrument, RawHalfCycle, SourceInfo};
//!
//! let time: Vec<f64> = (0..=3600).map(f64::from).collect();
//! let charge = RawHalfCycle::new(
//!     time.clone(),
//!     vec![1.0; time.len()],
//!     vec![1.0; time.len()],
//!     Branch::Charge,
//!     SourceInfo::new("charge.DTA", Instrument::Gamry),
//! )?;
//! let charge = HalfCycle::new(charge);
//! assert!((charge.capacity() - 1000.0).abs() < 1e-9); // mAh
//!
//! let cycle = Cycle::new(0, Some(charge), None)?;
//! assert_eq!(cycle.coulomb_efficiency(), None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cellcycling;
mod cycle;
mod error;
mod halfcycle;
mod units;

#[cfg(test)]
mod tests;

pub use cellcycling::CellCycling;
pub use cycle::{Cycle, CycleSummary};
pub use error::CycleError;
pub use halfcycle::{cumulative_trapezoid, join_halfcycles, join_records, HalfCycle, HalfCycleSummary};
pub use units::{ChargeUnit, EnergyUnit, Units};
