use chrono::NaiveDateTime;
use serde::Serialize;

use super::{CycleError, Units};
use crate::formats::{Branch, RawHalfCycle, SourceInfo};

/// Cumulative trapezoidal integral of `y` over `x` using absolute increments.
///
/// `out[0]` is zero and `out[k] = Σ_{j<k} |(y_j + y_{j+1}) / 2 · (x_{j+1} − x_j)|`, so the
/// result never decreases. Both slices must have the same length.
pub fn cumulative_trapezoid(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(x.len());
    let mut acc = 0.0;
    if !x.is_empty() {
        out.push(acc);
    }
    for (xs, ys) in x.windows(2).zip(y.windows(2)) {
        acc += (0.5 * (ys[0] + ys[1]) * (xs[1] - xs[0])).abs();
        out.push(acc);
    }
    out
}

/// One charge or discharge branch with its derived quantities.
///
/// Built once from a [`RawHalfCycle`]; all derived series are computed at
/// construction and the value is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfCycle {
    record: RawHalfCycle,
    units: Units,
    /// Cumulative charge in `units.charge`
    charge: Vec<f64>,
    /// Instantaneous power in W
    power: Vec<f64>,
    /// Cumulative energy in `units.energy`
    energy: Vec<f64>,
    total_coulombs: f64,
    total_joules: f64,
}

impl HalfCycle {
    /// Derive quantities in the default units (mAh, mWh)
    pub fn new(record: RawHalfCycle) -> Self {
        Self::with_units(record, Units::default())
    }

    /// Derive quantities in the given units
    pub fn with_units(record: RawHalfCycle, units: Units) -> Self {
        let coulombs = cumulative_trapezoid(record.time(), record.current());
        let power: Vec<f64> = record
            .current()
            .iter()
            .zip(record.voltage())
            .map(|(i, v)| i * v)
            .collect();
        let joules = cumulative_trapezoid(record.time(), &power);

        let total_coulombs = coulombs.last().copied().unwrap_or(0.0);
        let total_joules = joules.last().copied().unwrap_or(0.0);

        Self {
            charge: coulombs.iter().map(|&q| units.charge.from_coulombs(q)).collect(),
            energy: joules.iter().map(|&e| units.energy.from_joules(e)).collect(),
            power,
            total_coulombs,
            total_joules,
            units,
            record,
        }
    }

    /// Charge or discharge
    pub fn branch(&self) -> Branch {
        self.record.branch()
    }

    /// Units of the derived series
    pub fn units(&self) -> Units {
        self.units
    }

    /// Underlying record
    pub fn record(&self) -> &RawHalfCycle {
        &self.record
    }

    /// Source metadata
    pub fn source(&self) -> &SourceInfo {
        self.record.source()
    }

    /// Timestamp of the first sample
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.record.timestamp()
    }

    /// Sample times in s
    pub fn time(&self) -> &[f64] {
        self.record.time()
    }

    /// Sample currents in A
    pub fn current(&self) -> &[f64] {
        self.record.current()
    }

    /// Sample voltages in V
    pub fn voltage(&self) -> &[f64] {
        self.record.voltage()
    }

    /// Cumulative charge per sample
    pub fn charge_trace(&self) -> &[f64] {
        &self.charge
    }

    /// Instantaneous power per sample, in W (signed)
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Cumulative energy per sample
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Total accumulated charge
    pub fn capacity(&self) -> f64 {
        self.charge.last().copied().unwrap_or(0.0)
    }

    /// Total exchanged energy
    pub fn total_energy(&self) -> f64 {
        self.energy.last().copied().unwrap_or(0.0)
    }

    /// Elapsed time between the first and last sample, in s
    pub fn duration(&self) -> f64 {
        match (self.time().first(), self.time().last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Mean power over the half-cycle in W; absent for zero duration
    pub fn average_power(&self) -> Option<f64> {
        let duration = self.duration();
        (duration > 0.0).then(|| self.total_joules / duration)
    }

    /// Charge-weighted mean voltage (energy over charge) in V; absent for zero charge
    pub fn mean_voltage(&self) -> Option<f64> {
        (self.total_coulombs > 0.0).then(|| self.total_joules / self.total_coulombs)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Always false for a constructed half-cycle
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Give back the underlying record
    pub fn into_record(self) -> RawHalfCycle {
        self.record
    }

    /// Scalar summary of this half-cycle
    pub fn summary(&self) -> HalfCycleSummary {
        HalfCycleSummary {
            branch: self.branch(),
            samples: self.len(),
            capacity: self.capacity(),
            total_energy: self.total_energy(),
            duration: self.duration(),
            average_power: self.average_power(),
            mean_voltage: self.mean_voltage(),
        }
    }
}

/// Scalar quantities of one half-cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfCycleSummary {
    /// Charge or discharge
    pub branch: Branch,
    /// Number of samples
    pub samples: usize,
    /// Total charge in the half-cycle's charge unit
    pub capacity: f64,
    /// Total energy in the half-cycle's energy unit
    pub total_energy: f64,
    /// Duration in s
    pub duration: f64,
    /// Average power in W
    pub average_power: Option<f64>,
    /// Charge-weighted mean voltage in V
    pub mean_voltage: Option<f64>,
}

/// Join partial records of one branch into a single record.
///
/// The time axis of each later part is continued from the end of the previous
/// one: its samples are shifted by the previous part's last time plus its last
/// sampling interval. The result keeps the first part's source metadata.
pub fn join_records(parts: Vec<RawHalfCycle>) -> Result<RawHalfCycle, CycleError> {
    let mut parts = parts.into_iter();
    let first = parts.next().ok_or(CycleError::EmptyJoin)?;
    let (mut time, mut current, mut voltage, branch, mut source) = first.into_parts();

    for part in parts {
        if part.branch() != branch {
            return Err(CycleError::MixedBranches {
                first: branch,
                other: part.branch(),
            });
        }
        let (t, i, v, _, part_source) = part.into_parts();
        let last = time.last().copied().unwrap_or(0.0);
        let dt = match time.as_slice() {
            [.., a, b] => b - a,
            _ => 0.0,
        };
        time.extend(t.iter().map(|t| t + last + dt));
        current.extend(i);
        voltage.extend(v);
        source.name = format!("{} + {}", source.name, part_source.name);
    }

    Ok(RawHalfCycle::new(time, current, voltage, branch, source)?)
}

/// Join partial half-cycles, recomputing derived quantities in the first part's units
pub fn join_halfcycles(parts: Vec<HalfCycle>) -> Result<HalfCycle, CycleError> {
    let units = parts.first().map(HalfCycle::units).ok_or(CycleError::EmptyJoin)?;
    let record = join_records(parts.into_iter().map(HalfCycle::into_record).collect())?;
    Ok(HalfCycle::with_units(record, units))
}
