use log::{debug, warn};

use super::ManagerError;
use crate::cycles::{join_records, Cycle, HalfCycle, Units};
use crate::formats::{Branch, RawHalfCycle};

/// Options for [`pair_sequential`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingOptions {
    /// Reject one-sided cycles other than a terminal charge
    pub strict: bool,
    /// Join consecutive same-branch records first
    pub merge_partial: bool,
    /// Units for the derived quantities
    pub units: Units,
}

/// Indices of consecutive records sharing a branch.
///
/// Each group is a candidate for joining into one half-cycle.
pub fn group_consecutive(records: &[RawHalfCycle]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        match groups.last_mut() {
            Some(group) if records[group[0]].branch() == record.branch() => group.push(idx),
            _ => groups.push(vec![idx]),
        }
    }
    groups
}

fn merge_groups(records: Vec<RawHalfCycle>) -> Result<Vec<RawHalfCycle>, ManagerError> {
    let mut merged: Vec<Vec<RawHalfCycle>> = Vec::new();
    for record in records {
        match merged.last_mut() {
            Some(group) if group[0].branch() == record.branch() => group.push(record),
            _ => merged.push(vec![record]),
        }
    }
    merged
        .into_iter()
        .map(|group| {
            if group.len() > 1 {
                debug!("Joining {} partial {} records", group.len(), group[0].branch());
            }
            join_records(group).map_err(ManagerError::from)
        })
        .collect()
}

/// Pair records into cycles, strictly in the given order.
///
/// A charge opens a cycle and the next discharge closes it. A charge arriving
/// while another is pending emits the pending one as a one-sided cycle; a
/// discharge with nothing pending is a one-sided discharge cycle; a charge left
/// at the end is a one-sided terminal cycle. Cycles are numbered from zero.
pub fn pair_sequential(records: Vec<RawHalfCycle>, options: &PairingOptions) -> Result<Vec<Cycle>, ManagerError> {
    let records = if options.merge_partial {
        merge_groups(records)?
    } else {
        records
    };

    let mut cycles = Vec::with_capacity(records.len() / 2 + 1);
    let mut pending: Option<HalfCycle> = None;

    for (position, record) in records.into_iter().enumerate() {
        let half = HalfCycle::with_units(record, options.units);
        match half.branch() {
            Branch::Charge => {
                if let Some(unpaired) = pending.take() {
                    if options.strict {
                        return Err(ManagerError::UnpairedData {
                            position,
                            reason: "charge follows a charge with no discharge in between".to_string(),
                        });
                    }
                    warn!(
                        "Cycle {}: charge {} has no matching discharge",
                        cycles.len(),
                        unpaired.source().name
                    );
                    cycles.push(Cycle::new(cycles.len(), Some(unpaired), None)?);
                }
                pending = Some(half);
            }
            Branch::Discharge => match pending.take() {
                Some(charge) => cycles.push(Cycle::new(cycles.len(), Some(charge), Some(half))?),
                None => {
                    if options.strict {
                        return Err(ManagerError::UnpairedData {
                            position,
                            reason: "discharge without a preceding charge".to_string(),
                        });
                    }
                    warn!(
                        "Cycle {}: discharge {} has no preceding charge",
                        cycles.len(),
                        half.source().name
                    );
                    cycles.push(Cycle::new(cycles.len(), None, Some(half))?);
                }
            },
        }
    }

    if let Some(terminal) = pending {
        debug!("Cycle {}: terminal charge without discharge", cycles.len());
        cycles.push(Cycle::new(cycles.len(), Some(terminal), None)?);
    }
    Ok(cycles)
}
