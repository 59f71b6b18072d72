use chrono::NaiveDateTime;
use serde::Serialize;

use super::{CycleError, HalfCycle};
use crate::formats::Branch;

/// A charge/discharge pair, or a one-sided remainder
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    number: usize,
    charge: Option<HalfCycle>,
    discharge: Option<HalfCycle>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator)
}

impl Cycle {
    /// Build a cycle. At least one branch must be given, each in its own slot.
    pub fn new(
        number: usize,
        charge: Option<HalfCycle>,
        discharge: Option<HalfCycle>,
    ) -> Result<Self, CycleError> {
        if charge.is_none() && discharge.is_none() {
            return Err(CycleError::Empty { number });
        }
        for (slot, half) in [(Branch::Charge, &charge), (Branch::Discharge, &discharge)] {
            if let Some(half) = half {
                if half.branch() != slot {
                    return Err(CycleError::BranchMismatch {
                        number,
                        expected: slot,
                        found: half.branch(),
                    });
                }
            }
        }
        Ok(Self {
            number,
            charge,
            discharge,
        })
    }

    /// Ordinal number of the cycle
    pub fn number(&self) -> usize {
        self.number
    }

    pub(crate) fn renumber(mut self, number: usize) -> Self {
        self.number = number;
        self
    }

    /// Charge half-cycle
    pub fn charge(&self) -> Option<&HalfCycle> {
        self.charge.as_ref()
    }

    /// Discharge half-cycle
    pub fn discharge(&self) -> Option<&HalfCycle> {
        self.discharge.as_ref()
    }

    /// True when both branches are present
    pub fn is_complete(&self) -> bool {
        self.charge.is_some() && self.discharge.is_some()
    }

    /// Timestamp of the earliest branch
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.halves().find_map(HalfCycle::timestamp)
    }

    fn halves(&self) -> impl Iterator<Item = &HalfCycle> {
        self.charge.iter().chain(self.discharge.iter())
    }

    fn both(&self) -> Option<(&HalfCycle, &HalfCycle)> {
        Some((self.charge.as_ref()?, self.discharge.as_ref()?))
    }

    /// Charge capacity
    pub fn capacity_charge(&self) -> Option<f64> {
        self.charge().map(HalfCycle::capacity)
    }

    /// Discharge capacity
    pub fn capacity_discharge(&self) -> Option<f64> {
        self.discharge().map(HalfCycle::capacity)
    }

    /// Charge energy
    pub fn total_energy_charge(&self) -> Option<f64> {
        self.charge().map(HalfCycle::total_energy)
    }

    /// Discharge energy
    pub fn total_energy_discharge(&self) -> Option<f64> {
        self.discharge().map(HalfCycle::total_energy)
    }

    /// Coulombic efficiency `Q_dis / Q_ch` as a fraction
    pub fn coulomb_efficiency(&self) -> Option<f64> {
        let (charge, discharge) = self.both()?;
        ratio(discharge.capacity(), charge.capacity())
    }

    /// Energy efficiency `E_dis / E_ch` as a fraction.
    ///
    /// Equals `coulomb_efficiency() * voltage_efficiency()` whenever all three exist.
    pub fn energy_efficiency(&self) -> Option<f64> {
        let (charge, discharge) = self.both()?;
        ratio(discharge.total_energy(), charge.total_energy())
    }

    /// Voltaic efficiency: ratio of the charge-weighted mean voltages
    pub fn voltage_efficiency(&self) -> Option<f64> {
        let (charge, discharge) = self.both()?;
        ratio(discharge.mean_voltage()?, charge.mean_voltage()?)
    }

    fn concat(&self, series: impl Fn(&HalfCycle) -> &[f64]) -> Vec<f64> {
        self.halves().flat_map(|h| series(h).iter().copied()).collect()
    }

    /// Sample times of charge followed by discharge
    pub fn time(&self) -> Vec<f64> {
        self.concat(HalfCycle::time)
    }

    /// Voltages of charge followed by discharge
    pub fn voltage(&self) -> Vec<f64> {
        self.concat(HalfCycle::voltage)
    }

    /// Currents of charge followed by discharge
    pub fn current(&self) -> Vec<f64> {
        self.concat(HalfCycle::current)
    }

    /// Power of charge followed by discharge
    pub fn power(&self) -> Vec<f64> {
        self.concat(HalfCycle::power)
    }

    /// Cumulative energy of charge followed by discharge (each restarts at zero)
    pub fn energy(&self) -> Vec<f64> {
        self.concat(HalfCycle::energy)
    }

    /// Cumulative charge of charge followed by discharge (each restarts at zero)
    pub fn charge_trace(&self) -> Vec<f64> {
        self.concat(HalfCycle::charge_trace)
    }

    /// Time axes of both branches prepared for an overlay plot.
    ///
    /// When the two branches do not start at the same time, the charge axis is
    /// shifted to start at zero and the discharge axis to end at zero. With
    /// `reverse` the discharge axis becomes `|t_dis − t_ch,last|`. Absent unless
    /// both branches are present.
    pub fn aligned_time(&self, reverse: bool) -> Option<(Vec<f64>, Vec<f64>)> {
        let (charge, discharge) = self.both()?;
        let (ct, dt) = (charge.time(), discharge.time());
        let (mut charge_time, mut discharge_time) = (ct.to_vec(), dt.to_vec());

        if ct.first() != dt.first() {
            let c0 = ct.first().copied().unwrap_or(0.0);
            let d_end = dt.last().copied().unwrap_or(0.0);
            charge_time.iter_mut().for_each(|t| *t -= c0);
            discharge_time.iter_mut().for_each(|t| *t -= d_end);
        }
        if reverse {
            let c_end = charge_time.last().copied().unwrap_or(0.0);
            discharge_time.iter_mut().for_each(|t| *t = (*t - c_end).abs());
        }
        Some((charge_time, discharge_time))
    }

    /// Scalar summary row of this cycle
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            number: self.number,
            timestamp: self.timestamp(),
            charge_capacity: self.capacity_charge(),
            discharge_capacity: self.capacity_discharge(),
            charge_energy: self.total_energy_charge(),
            discharge_energy: self.total_energy_discharge(),
            coulomb_efficiency: self.coulomb_efficiency(),
            energy_efficiency: self.energy_efficiency(),
            voltage_efficiency: self.voltage_efficiency(),
        }
    }
}

/// Per-cycle scalars, used for reports and exports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    /// Cycle number
    pub number: usize,
    /// Timestamp of the first branch
    pub timestamp: Option<NaiveDateTime>,
    /// Charge capacity
    pub charge_capacity: Option<f64>,
    /// Discharge capacity
    pub discharge_capacity: Option<f64>,
    /// Charge energy
    pub charge_energy: Option<f64>,
    /// Discharge energy
    pub discharge_energy: Option<f64>,
    /// Coulombic efficiency (fraction)
    pub coulomb_efficiency: Option<f64>,
    /// Energy efficiency (fraction)
    pub energy_efficiency: Option<f64>,
    /// Voltaic efficiency (fraction)
    pub voltage_efficiency: Option<f64>,
}
