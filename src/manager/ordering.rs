use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::FetchOrder;
use crate::formats::{Branch, RawHalfCycle};

/// Sequence number encoded in a file name: the last run of digits in the stem.
///
/// `Charge_#3.DTA` → 3, `discharge 12 b.DTA` → 12, `charge.DTA` → none.
pub fn sequence_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end]
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    stem[start..end].parse().ok()
}

fn branch_rank(records: &[RawHalfCycle]) -> u8 {
    match records.first().map(RawHalfCycle::branch) {
        Some(Branch::Charge) => 0,
        Some(Branch::Discharge) => 1,
        None => 2,
    }
}

/// Order the parsed files of one fetch call and flatten them into records.
pub(crate) fn order_batch(mut batch: Vec<(PathBuf, Vec<RawHalfCycle>)>, order: FetchOrder) -> Vec<RawHalfCycle> {
    match order {
        FetchOrder::FileName => {
            let numbered: Option<Vec<u64>> = batch.iter().map(|(p, _)| sequence_number(p)).collect();
            if numbered.is_some() {
                batch.sort_by_cached_key(|(path, records)| {
                    (sequence_number(path), branch_rank(records), path.clone())
                });
            } else {
                batch.sort_by(|a, b| a.0.cmp(&b.0));
            }
            batch.into_iter().flat_map(|(_, records)| records).collect()
        }
        FetchOrder::Timestamp => {
            batch.sort_by(|a, b| a.0.cmp(&b.0));
            let mut records: Vec<RawHalfCycle> = batch.into_iter().flat_map(|(_, records)| records).collect();
            records.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
            records
        }
    }
}
