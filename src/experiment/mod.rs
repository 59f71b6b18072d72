//! # Rate experiments
//!
//! A [`RateExperiment`] aggregates cycling experiments recorded at different fixed
//! currents into flat, globally numbered series for rate-capability analysis.
//!
//! Four construction paths converge on the same `Vec<RateStep>`:
//!
//! | Constructor | Source |
//! |-------------|--------|
//! | [`RateExperiment::new`] | parallel lists of currents and [`CellCycling`]s |
//! | [`RateExperiment::from_biologic_battery_module`] | one Biologic battery-module `.mpt` |
//! | [`RateExperiment::from_rate_table`] | a delimited per-cycle summary table |
//! | [`RateExperiment::from_gamry_folder_tree`] | the Gamry base / step / `CHARGE_DISCHARGE` tree |
//!
//! Global cycle numbers start at 1 and increase strictly across step boundaries.

mod error;


use std::fmt;
use std::path::Path;

use log::{info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

pub use error::RateError;

use crate::cycles::{CellCycling, Units};
use crate::formats::{self, biologic, Instrument, ParseOptions, ParsedContent, RateTableRow};
use crate::manager::{self, FetchReport, FileManager, ManagerConfig, PairingOptions};

/// One cycle of a rate experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatePoint {
    /// Global cycle number, 1-based
    pub number: usize,
    /// Index of the cycle inside its step
    pub step_cycle: usize,
    /// Discharge capacity
    pub capacity: Option<f64>,
    /// Coulombic efficiency (fraction)
    pub coulomb_efficiency: Option<f64>,
    /// Energy efficiency (fraction)
    pub energy_efficiency: Option<f64>,
    /// Voltaic efficiency (fraction)
    pub voltage_efficiency: Option<f64>,
    /// Discharge energy
    pub total_energy: Option<f64>,
    /// Mean discharge power in W
    pub average_power: Option<f64>,
}

/// The cycles recorded at one applied current
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateStep {
    /// Applied current in A
    pub current: f64,
    /// Cycles in order
    pub points: Vec<RatePoint>,
}

/// Cycling experiments at different currents, aggregated into flat series
#[derive(Debug, Clone, PartialEq)]
pub struct RateExperiment {
    steps: Vec<RateStep>,
    reference: Option<(usize, usize)>,
}

fn renumber(steps: &mut [RateStep]) {
    let mut number = 1;
    for point in steps.iter_mut().flat_map(|s| s.points.iter_mut()) {
        point.number = number;
        number += 1;
    }
}

fn points_from_cycling(cycling: &CellCycling) -> Vec<RatePoint> {
    cycling
        .iter()
        .enumerate()
        .map(|(step_cycle, cycle)| RatePoint {
            number: 0,
            step_cycle,
            capacity: cycle.capacity_discharge(),
            coulomb_efficiency: cycle.coulomb_efficiency(),
            energy_efficiency: cycle.energy_efficiency(),
            voltage_efficiency: cycle.voltage_efficiency(),
            total_energy: cycle.total_energy_discharge(),
            average_power: cycle.discharge().and_then(|d| d.average_power()),
        })
        .collect()
}

fn points_from_rows(rows: &[RateTableRow]) -> Vec<RatePoint> {
    rows.iter()
        .enumerate()
        .map(|(step_cycle, row)| RatePoint {
            number: 0,
            step_cycle,
            capacity: row.discharge_capacity,
            coulomb_efficiency: row.coulomb_efficiency,
            energy_efficiency: row.energy_efficiency,
            voltage_efficiency: row.voltage_efficiency,
            total_energy: None,
            average_power: None,
        })
        .collect()
}

impl RateExperiment {
    fn from_steps(mut steps: Vec<RateStep>) -> Self {
        renumber(&mut steps);
        Self { steps, reference: None }
    }

    /// Aggregate one cycling experiment per current
    pub fn new(currents: &[f64], cyclings: &[CellCycling]) -> Result<Self, RateError> {
        if currents.len() != cyclings.len() {
            return Err(RateError::MismatchedSteps {
                currents: currents.len(),
                steps: cyclings.len(),
            });
        }
        let steps = currents
            .iter()
            .zip(cyclings)
            .map(|(&current, cycling)| RateStep {
                current,
                points: points_from_cycling(cycling),
            })
            .collect();
        Ok(Self::from_steps(steps))
    }

    /// Build from a Biologic battery-module file.
    ///
    /// A new step starts wherever the programmed sequence current changes; the
    /// half-cycles of each step are paired sequentially.
    pub fn from_biologic_battery_module<P: AsRef<Path>>(path: P, units: Units) -> Result<Self, RateError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| formats::FormatError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        let module = biologic::parse_battery_module(path, &String::from_utf8_lossy(&bytes))?;

        let mut groups: Vec<(f64, Vec<formats::RawHalfCycle>)> = Vec::new();
        for segment in module.segments {
            match groups.last_mut() {
                Some((current, records)) if *current == segment.current => records.push(segment.record),
                _ => groups.push((segment.current, vec![segment.record])),
            }
        }

        let options = PairingOptions {
            units,
            ..Default::default()
        };
        let mut currents = Vec::with_capacity(groups.len());
        let mut cyclings = Vec::with_capacity(groups.len());
        for (current, records) in groups {
            currents.push(current);
            cyclings.push(CellCycling::new(manager::pair_sequential(records, &options)?)?);
        }
        info!("{}: {} rate steps", path.display(), currents.len());
        Self::new(&currents, &cyclings)
    }

    /// Build from a delimited rate-test summary table.
    ///
    /// Rows are partitioned into steps where the current column changes value.
    pub fn from_rate_table<P: AsRef<Path>>(path: P) -> Result<Self, RateError> {
        let path = path.as_ref();
        let parsed = formats::parse_file(path, &ParseOptions::default().with_instrument(Instrument::RateTable))?;
        let table = match parsed.content {
            ParsedContent::RateSummary(table) => table,
            ParsedContent::HalfCycles(_) => {
                return Err(formats::FormatError::UnsupportedInstrument {
                    file: path.to_path_buf(),
                    reason: "not a rate-summary table".to_string(),
                }
                .into())
            }
        };
        let steps = table
            .steps()
            .into_iter()
            .map(|(current, rows)| RateStep {
                current,
                points: points_from_rows(rows),
            })
            .collect();
        Ok(Self::from_steps(steps))
    }

    /// Build from a Gamry folder tree, one session per step folder.
    ///
    /// File failures inside a step do not abort it; they come back in the
    /// per-step [`FetchReport`]s, in step order.
    pub fn from_gamry_folder_tree<P: AsRef<Path>>(
        base: P,
        config: &ManagerConfig,
    ) -> Result<(Self, Vec<FetchReport>), RateError> {
        let steps = manager::discover_gamry_tree(base.as_ref(), &config.reserved_folder)?;

        let ingest = |step: &manager::StepFolder| -> Result<(f64, CellCycling, FetchReport), RateError> {
            let mut session = FileManager::with_config(config.clone());
            let report = session.fetch_from_folder(&step.data_folder, "dta")?;
            if !report.is_complete() {
                warn!(
                    "Step {} A: {} files failed",
                    step.current,
                    report.failed.len()
                );
            }
            Ok((step.current, session.into_cellcycling()?, report))
        };

        #[cfg(feature = "parallel")]
        let ingested: Vec<(f64, CellCycling, FetchReport)> =
            steps.par_iter().map(ingest).collect::<Result<_, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let ingested: Vec<(f64, CellCycling, FetchReport)> =
            steps.iter().map(ingest).collect::<Result<_, _>>()?;

        let mut currents = Vec::with_capacity(ingested.len());
        let mut cyclings = Vec::with_capacity(ingested.len());
        let mut reports = Vec::with_capacity(ingested.len());
        for (current, cycling, report) in ingested {
            currents.push(current);
            cyclings.push(cycling);
            reports.push(report);
        }
        Ok((Self::new(&currents, &cyclings)?, reports))
    }

    /// Steps in order
    pub fn steps(&self) -> &[RateStep] {
        &self.steps
    }

    /// Iterate over every point across steps
    pub fn points(&self) -> impl Iterator<Item = &RatePoint> {
        self.steps.iter().flat_map(|s| s.points.iter())
    }

    /// Total number of cycles across steps
    pub fn len(&self) -> usize {
        self.steps.iter().map(|s| s.points.len()).sum()
    }

    /// Whether the experiment holds no cycles
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Global cycle numbers
    pub fn numbers(&self) -> Vec<usize> {
        self.points().map(|p| p.number).collect()
    }

    /// Applied current of every point
    pub fn current_steps(&self) -> Vec<f64> {
        self.steps
            .iter()
            .flat_map(|s| std::iter::repeat(s.current).take(s.points.len()))
            .collect()
    }

    /// One current per step
    pub fn step_currents(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.current).collect()
    }

    /// Discharge capacity of every point
    pub fn capacity(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.capacity).collect()
    }

    /// Coulombic efficiency of every point
    pub fn coulomb_efficiencies(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.coulomb_efficiency).collect()
    }

    /// Energy efficiency of every point
    pub fn energy_efficiencies(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.energy_efficiency).collect()
    }

    /// Voltaic efficiency of every point
    pub fn voltage_efficiencies(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.voltage_efficiency).collect()
    }

    /// Discharge energy of every point
    pub fn total_energy(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.total_energy).collect()
    }

    /// Mean discharge power of every point
    pub fn average_power(&self) -> Vec<Option<f64>> {
        self.points().map(|p| p.average_power).collect()
    }

    /// Retention reference as `(step, point)`.
    ///
    /// Defaults to the first point with a capacity.
    pub fn reference(&self) -> Option<(usize, usize)> {
        self.reference.or_else(|| {
            self.steps.iter().enumerate().find_map(|(s, step)| {
                step.points
                    .iter()
                    .position(|p| p.capacity.is_some())
                    .map(|p| (s, p))
            })
        })
    }

    /// Override the retention reference
    pub fn set_reference(&mut self, step: usize, point: usize) -> Result<(), RateError> {
        let valid = self.steps.get(step).is_some_and(|s| point < s.points.len());
        if !valid {
            return Err(RateError::ReferenceOutOfRange { step, point });
        }
        self.reference = Some((step, point));
        Ok(())
    }

    /// Capacity of every point relative to the reference point
    pub fn capacity_retention(&self) -> Vec<Option<f64>> {
        let reference = self
            .reference()
            .and_then(|(s, p)| self.steps[s].points[p].capacity)
            .filter(|c| *c != 0.0);
        self.points()
            .map(|p| match (p.capacity, reference) {
                (Some(c), Some(r)) => Some(c / r),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for RateExperiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rate Experiment")?;
        writeln!(f, "---")?;
        for step in &self.steps {
            writeln!(f, "{}A : {} cycles", step.current, step.points.len())?;
        }
        Ok(())
    }
}
