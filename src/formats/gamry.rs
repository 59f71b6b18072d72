//! Gamry `.DTA` single half-cycle files.
//!
//! A DTA file is a tab-separated header of `KEY\tTYPE\tVALUE\tDESCRIPTION` lines
//! followed by a `CURVE\tTABLE\t<n>` block: one column-name row, one unit row and
//! `n` data rows. Numbers follow the locale of the acquisition workstation.

use std::path::Path;

use log::debug;

use super::numeric::{parse_date_time, DecimalSeparator};
use super::{Branch, FormatError, Instrument, RawHalfCycle, SourceInfo};

/// Temperature reported by an unconnected probe
const DISCONNECTED_PROBE: f64 = -273.0;

struct Columns {
    time: usize,
    voltage: usize,
    current: usize,
    temperature: Option<usize>,
}

impl Columns {
    fn locate(names: &[&str], file: &Path) -> Result<Self, FormatError> {
        let find = |name: &str| names.iter().position(|n| n.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| FormatError::malformed(file, format!("CURVE table has no '{}' column", name)))
        };
        Ok(Self {
            time: require("T")?,
            voltage: require("Vf")?,
            current: require("Im")?,
            temperature: find("Temp"),
        })
    }
}

/// Parse one Gamry half-cycle.
///
/// Rows with `T <= 0` precede the step and are dropped. The remaining time axis is
/// kept as time since step start.
pub fn parse(file: &Path, text: &str) -> Result<RawHalfCycle, FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

    let mut date = None;
    let mut time = None;
    let mut step_current = None;
    let mut curve = None;

    for (idx, line) in lines.iter().enumerate() {
        let mut tokens = line.split_whitespace();
        let key = tokens.next().unwrap_or_default();
        if key == "DATE" {
            date = tokens.nth(1);
        } else if key == "TIME" {
            time = tokens.nth(1);
        } else if key == "ISTEP1" || line.contains("Step 1 Current (A)") {
            step_current = tokens.nth(1);
        } else if key == "CURVE" {
            let npoints = line
                .split_whitespace()
                .last()
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| FormatError::malformed(file, "CURVE line has no point count"))?;
            curve = Some((idx, npoints));
            break;
        }
    }

    let (curve_idx, npoints) = curve.ok_or_else(|| FormatError::malformed(file, "CURVE table not found"))?;
    let names: Vec<&str> = lines
        .get(curve_idx + 1)
        .ok_or_else(|| FormatError::malformed(file, "CURVE table has no column names"))?
        .split('\t')
        .collect();
    let columns = Columns::locate(&names, file)?;

    let first_data = curve_idx + 3;
    let rows = lines.get(first_data..).unwrap_or_default();
    if rows.len() < npoints {
        return Err(FormatError::malformed(
            file,
            format!("CURVE declares {} points but only {} rows follow", npoints, rows.len()),
        ));
    }
    let rows = &rows[..npoints];

    let separator = rows
        .first()
        .and_then(|row| row.split('\t').nth(columns.current))
        .map(DecimalSeparator::detect)
        .unwrap_or_default();

    let mut t = Vec::with_capacity(npoints);
    let mut current = Vec::with_capacity(npoints);
    let mut voltage = Vec::with_capacity(npoints);
    let mut temperatures = Vec::new();

    for (k, row) in rows.iter().enumerate() {
        let fields: Vec<&str> = row.split('\t').collect();
        let value = |col: usize, name: &str| {
            fields
                .get(col)
                .and_then(|f| separator.parse(f))
                .ok_or_else(|| FormatError::malformed(file, format!("row {}: missing or non-numeric '{}'", k, name)))
        };
        let ts = value(columns.time, "T")?;
        if ts <= 0.0 {
            continue;
        }
        t.push(ts);
        voltage.push(value(columns.voltage, "Vf")?);
        current.push(value(columns.current, "Im")?);
        if let Some(temp) = columns
            .temperature
            .and_then(|col| fields.get(col))
            .and_then(|f| separator.parse(f))
        {
            temperatures.push(temp);
        }
    }

    if t.is_empty() {
        return Err(FormatError::malformed(file, "no samples after step start"));
    }

    let timestamp = match (date, time) {
        (Some(d), Some(tm)) => parse_date_time(d, tm, separator)
            .ok_or_else(|| FormatError::malformed(file, format!("invalid timestamp '{} {}'", d, tm)))?,
        _ => return Err(FormatError::malformed(file, "DATE/TIME header lines not found")),
    };

    let branch = step_current
        .and_then(|s| separator.parse(s))
        .and_then(Branch::from_current)
        .or_else(|| Branch::from_current(current[0]))
        .ok_or_else(|| FormatError::malformed(file, "cannot determine charge/discharge from step current"))?;

    let connected: Vec<f64> = temperatures.into_iter().filter(|&v| v > DISCONNECTED_PROBE).collect();
    let temperature = if connected.is_empty() {
        None
    } else {
        Some(connected.iter().sum::<f64>() / connected.len() as f64)
    };

    debug!(
        "Parsed Gamry {} with {} samples ({:?} decimals)",
        branch,
        t.len(),
        separator
    );

    let mut source = SourceInfo::new(file, Instrument::Gamry);
    source.timestamp = Some(timestamp);
    source.temperature = temperature;
    RawHalfCycle::new(t, current, voltage, branch, source)
}
