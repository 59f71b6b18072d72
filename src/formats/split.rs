//! Strategies for cutting a multi-half-cycle table into branches.
//!
//! A Biologic cycling table holds every charge and discharge of an experiment in
//! one run of rows. A [`HalfCycleSplitter`] decides where one branch ends and the
//! next begins. Two strategies are built in; callers may supply their own through
//! [`ParseOptions`](super::ParseOptions).

use std::ops::Range;

use super::Branch;

/// Per-row view handed to a splitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRow {
    /// Time in seconds
    pub time: f64,
    /// Current in amperes, as written by the instrument
    pub current: f64,
    /// Value of the technique column (`ox/red`), if the file has one
    pub technique: Option<i64>,
}

/// A contiguous run of rows forming one half-cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Branch of the run
    pub branch: Branch,
    /// Row range, relative to the slice given to the splitter
    pub range: Range<usize>,
}

/// Splits one block of rows into half-cycle segments.
///
/// Returned segments must be ordered, non-overlapping and inside `0..rows.len()`.
/// An `Err` carries a human-readable reason and becomes a `MalformedFile` error.
pub trait HalfCycleSplitter: Send + Sync {
    /// Segment the rows
    fn split(&self, rows: &[SplitRow]) -> Result<Vec<Segment>, String>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

/// Splits on changes of the explicit technique column (`ox/red`: 1 = charge, 0 = discharge)
#[derive(Debug, Clone, Copy, Default)]
pub struct TechniqueColumnSplitter;

impl HalfCycleSplitter for TechniqueColumnSplitter {
    fn split(&self, rows: &[SplitRow]) -> Result<Vec<Segment>, String> {
        let mut segments: Vec<Segment> = Vec::new();
        for (k, row) in rows.iter().enumerate() {
            let branch = match row.technique {
                Some(1) => Branch::Charge,
                Some(0) => Branch::Discharge,
                Some(other) => return Err(format!("unexpected ox/red value {} at row {}", other, k)),
                None => return Err(format!("missing ox/red value at row {}", k)),
            };
            match segments.last_mut() {
                Some(last) if last.branch == branch => last.range.end = k + 1,
                _ => segments.push(Segment {
                    branch,
                    range: k..k + 1,
                }),
            }
        }
        Ok(segments)
    }

    fn name(&self) -> &str {
        "technique-column"
    }
}

/// Splits where the sign of the current changes.
///
/// Rows whose magnitude is at or below `threshold` (rest periods) stay with the
/// segment they follow; leading rest rows join the first segment.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSignSplitter {
    /// Magnitude in amperes below which a row has no branch of its own
    pub threshold: f64,
}

impl Default for CurrentSignSplitter {
    fn default() -> Self {
        Self { threshold: 0.0 }
    }
}

impl HalfCycleSplitter for CurrentSignSplitter {
    fn split(&self, rows: &[SplitRow]) -> Result<Vec<Segment>, String> {
        let mut segments: Vec<Segment> = Vec::new();
        for (k, row) in rows.iter().enumerate() {
            let branch = if row.current.abs() > self.threshold {
                Branch::from_current(row.current)
            } else {
                None
            };
            match (segments.last_mut(), branch) {
                (Some(last), None) => last.range.end = k + 1,
                (Some(last), Some(b)) if last.branch == b => last.range.end = k + 1,
                (_, Some(b)) => {
                    let start = if segments.is_empty() { 0 } else { k };
                    segments.push(Segment {
                        branch: b,
                        range: start..k + 1,
                    });
                }
                (None, None) => {}
            }
        }
        if segments.is_empty() && !rows.is_empty() {
            return Err(format!(
                "no row exceeds the {} A current threshold",
                self.threshold
            ));
        }
        Ok(segments)
    }

    fn name(&self) -> &str {
        "current-sign"
    }
}
