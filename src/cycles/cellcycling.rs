use std::fmt;
use std::ops::Index;

use chrono::NaiveDateTime;

use super::{Cycle, CycleError, CycleSummary};

/// Ordered cycles of one continuous experiment.
///
/// Cycle order is experiment order and is never changed. Cycle numbers are
/// contiguous and ascending from the first cycle's number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellCycling {
    cycles: Vec<Cycle>,
    reference: Option<usize>,
}

impl CellCycling {
    /// Wrap an ordered list of cycles, checking that their numbers are contiguous
    pub fn new(cycles: Vec<Cycle>) -> Result<Self, CycleError> {
        if let Some(first) = cycles.first().map(Cycle::number) {
            for (position, cycle) in cycles.iter().enumerate() {
                let expected = first + position;
                if cycle.number() != expected {
                    return Err(CycleError::NonContiguous {
                        position,
                        expected,
                        found: cycle.number(),
                    });
                }
            }
        }
        Ok(Self {
            cycles,
            reference: None,
        })
    }

    /// Start of the experiment: timestamp of the first constituent record
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.cycles.first().and_then(Cycle::timestamp)
    }

    /// Index of the retention reference cycle.
    ///
    /// Defaults to the first cycle with both branches; `None` if there is none
    /// and no override was set.
    pub fn reference(&self) -> Option<usize> {
        self.reference
            .or_else(|| self.cycles.iter().position(Cycle::is_complete))
    }

    /// Use the cycle at `index` as retention reference
    pub fn set_reference(&mut self, index: usize) -> Result<(), CycleError> {
        if index >= self.cycles.len() {
            return Err(CycleError::ReferenceOutOfRange {
                index,
                len: self.cycles.len(),
            });
        }
        self.reference = Some(index);
        Ok(())
    }

    /// Go back to the default reference
    pub fn clear_reference(&mut self) {
        self.reference = None;
    }

    /// Discharge capacity of each cycle relative to the reference cycle.
    ///
    /// Entries are absent where a cycle has no discharge, and the whole sequence is
    /// absent when the reference has no discharge or a zero one.
    pub fn capacity_retention(&self) -> Vec<Option<f64>> {
        let reference = self
            .reference()
            .and_then(|r| self.cycles[r].capacity_discharge())
            .filter(|&c| c != 0.0);
        self.cycles
            .iter()
            .map(|c| Some(c.capacity_discharge()? / reference?))
            .collect()
    }

    /// Successive differences of [`capacity_retention`](Self::capacity_retention),
    /// one entry per adjacent pair
    pub fn capacity_fade(&self) -> Vec<Option<f64>> {
        self.capacity_retention()
            .windows(2)
            .map(|w| Some(w[1]? - w[0]?))
            .collect()
    }

    /// Cycle numbers
    pub fn numbers(&self) -> Vec<usize> {
        self.cycles.iter().map(Cycle::number).collect()
    }

    /// Discharge capacity per cycle
    pub fn capacities(&self) -> Vec<Option<f64>> {
        self.cycles.iter().map(Cycle::capacity_discharge).collect()
    }

    /// Coulombic efficiency per cycle
    pub fn coulomb_efficiencies(&self) -> Vec<Option<f64>> {
        self.cycles.iter().map(Cycle::coulomb_efficiency).collect()
    }

    /// Energy efficiency per cycle
    pub fn energy_efficiencies(&self) -> Vec<Option<f64>> {
        self.cycles.iter().map(Cycle::energy_efficiency).collect()
    }

    /// Voltaic efficiency per cycle
    pub fn voltage_efficiencies(&self) -> Vec<Option<f64>> {
        self.cycles.iter().map(Cycle::voltage_efficiency).collect()
    }

    /// Summary row per cycle
    pub fn summaries(&self) -> Vec<CycleSummary> {
        self.cycles.iter().map(Cycle::summary).collect()
    }

    /// Iterate over the cycles in order
    pub fn iter(&self) -> std::slice::Iter<'_, Cycle> {
        self.cycles.iter()
    }

    /// Cycle at position `index`
    pub fn get(&self, index: usize) -> Option<&Cycle> {
        self.cycles.get(index)
    }

    /// Number of cycles
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// True if there are no cycles
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// All cycles as a slice
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Take the cycles out
    pub fn into_cycles(self) -> Vec<Cycle> {
        self.cycles
    }
}

impl Index<usize> for CellCycling {
    type Output = Cycle;

    fn index(&self, index: usize) -> &Cycle {
        &self.cycles[index]
    }
}

impl<'a> IntoIterator for &'a CellCycling {
    type Item = &'a Cycle;
    type IntoIter = std::slice::Iter<'a, Cycle>;

    fn into_iter(self) -> Self::IntoIter {
        self.cycles.iter()
    }
}

impl fmt::Display for CellCycling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let complete = self.cycles.iter().filter(|c| c.is_complete()).count();
        writeln!(f, "Cell Cycling")?;
        writeln!(f, "  Cycles:          {}", self.cycles.len())?;
        writeln!(f, "  Complete cycles: {}", complete)?;
        match self.reference() {
            Some(r) => writeln!(f, "  Reference cycle: {}", r)?,
            None => writeln!(f, "  Reference cycle: none")?,
        }
        if let Some(ts) = self.timestamp() {
            writeln!(f, "  Started:         {}", ts)?;
        }
        Ok(())
    }
}
