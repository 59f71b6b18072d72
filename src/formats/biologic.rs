//! Biologic EC-Lab `.mpt` text exports.
//!
//! An MPT file opens with a free-form settings block and ends with one
//! tab-separated table whose header row starts with `mode`. Two layouts are
//! handled here:
//!
//! - **Cycling**: a whole galvanostatic experiment in one table. Optional
//!   `Loop k from point number a to b` header lines bound each loop, and an
//!   `ox/red` technique column marks charge (1) and discharge (0) rows.
//! - **Battery module**: a multi-sequence protocol. Header keyword lines (`Ns`,
//!   `ctrl_type`, `ctrl1_val`, `charge/discharge`) describe each sequence, and the
//!   `Ns` column tags every data row with the sequence it belongs to.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};

use super::numeric::{parse_date_time, DecimalSeparator};
use super::split::{HalfCycleSplitter, SplitRow};
use super::{Branch, FormatError, Instrument, RawHalfCycle, SourceInfo};

const ACQUISITION_MARKER: &str = "Acquisition started on :";

/// One sequence of a battery-module file
#[derive(Debug, Clone)]
pub struct ModuleSegment {
    /// Sequence number (`Ns`)
    pub sequence: u32,
    /// Applied current of the sequence in amperes, as programmed (unsigned)
    pub current: f64,
    /// Samples of the sequence
    pub record: RawHalfCycle,
}

/// Parsed battery-module file
#[derive(Debug, Clone)]
pub struct BatteryModule {
    /// Acquisition start
    pub timestamp: NaiveDateTime,
    /// Segments in file order
    pub segments: Vec<ModuleSegment>,
}

/// Header lines shared by both layouts
struct Preamble<'a> {
    acquisition: Option<(&'a str, &'a str)>,
    loops: Vec<(usize, usize)>,
    keywords: HashMap<&'static str, Vec<&'a str>>,
    header_idx: usize,
}

const MODULE_KEYWORDS: [&str; 5] = ["Ns", "ctrl_type", "ctrl1_val", "ctrl1_val_unit", "charge/discharge"];

fn read_preamble<'a>(file: &Path, lines: &[&'a str]) -> Result<Preamble<'a>, FormatError> {
    let mut acquisition = None;
    let mut loops = Vec::new();
    let mut keywords = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.starts_with("mode\t") || line.trim() == "mode" {
            return Ok(Preamble {
                acquisition,
                loops,
                keywords,
                header_idx: idx,
            });
        }
        if let Some(pos) = line.find(ACQUISITION_MARKER) {
            let mut tokens = line[pos + ACQUISITION_MARKER.len()..].split_whitespace();
            if let (Some(d), Some(t)) = (tokens.next(), tokens.next()) {
                acquisition = Some((d, t));
            }
        } else if line.starts_with("Loop ") {
            let numbers: Vec<usize> = line
                .split_whitespace()
                .filter_map(|tok| tok.parse().ok())
                .collect();
            if let [_, first, last] = numbers.as_slice() {
                loops.push((*first, *last));
            } else {
                warn!("Ignoring unreadable loop line in {}: '{}'", file.display(), line);
            }
        } else if let Some(keyword) = MODULE_KEYWORDS
            .iter()
            .find(|k| line.strip_prefix(**k).is_some_and(|rest| rest.starts_with([' ', '\t'])))
        {
            let values = line[keyword.len()..].split_whitespace().collect();
            keywords.insert(*keyword, values);
        }
    }
    Err(FormatError::malformed(file, "table header starting with 'mode' not found"))
}

fn acquisition_start(
    file: &Path,
    acquisition: Option<(&str, &str)>,
    separator: DecimalSeparator,
) -> Result<NaiveDateTime, FormatError> {
    let (date, time) = acquisition
        .ok_or_else(|| FormatError::malformed(file, format!("'{}' line not found", ACQUISITION_MARKER)))?;
    parse_date_time(date, time, separator)
        .ok_or_else(|| FormatError::malformed(file, format!("invalid acquisition timestamp '{} {}'", date, time)))
}

fn offset(start: NaiveDateTime, seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_milliseconds((seconds * 1000.0).round() as i64).and_then(|d| start.checked_add_signed(d))
}

/// Table columns used by the cycling parsers
struct Table {
    time: Vec<f64>,
    voltage: Vec<f64>,
    current: Vec<f64>,
    technique: Option<Vec<i64>>,
    sequence: Option<Vec<u32>>,
    separator: DecimalSeparator,
}

fn read_table(file: &Path, lines: &[&str], header_idx: usize) -> Result<Table, FormatError> {
    let header: Vec<&str> = lines[header_idx].split('\t').map(str::trim).collect();
    let find = |names: &[&str]| header.iter().position(|h| names.contains(h));
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| FormatError::malformed(file, format!("table has no '{}' column", names[0])))
    };
    let time_col = require(&["time/s"])?;
    let voltage_col = require(&["Ewe/V"])?;
    let current_col = require(&["I/mA", "<I>/mA"])?;
    let technique_col = find(&["ox/red"]);
    let sequence_col = find(&["Ns"]);

    let rows: Vec<Vec<&str>> = lines[header_idx + 1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.split('\t').collect())
        .collect();
    if rows.is_empty() {
        return Err(FormatError::malformed(file, "table has no data rows"));
    }
    let separator = rows[0]
        .get(voltage_col)
        .map(|f| DecimalSeparator::detect(f))
        .unwrap_or_default();

    let mut table = Table {
        time: Vec::with_capacity(rows.len()),
        voltage: Vec::with_capacity(rows.len()),
        current: Vec::with_capacity(rows.len()),
        technique: technique_col.map(|_| Vec::with_capacity(rows.len())),
        sequence: sequence_col.map(|_| Vec::with_capacity(rows.len())),
        separator,
    };
    for (k, fields) in rows.iter().enumerate() {
        let value = |col: usize, name: &str| {
            fields
                .get(col)
                .and_then(|f| separator.parse(f))
                .ok_or_else(|| FormatError::malformed(file, format!("row {}: missing or non-numeric '{}'", k, name)))
        };
        table.time.push(value(time_col, "time/s")?);
        table.voltage.push(value(voltage_col, "Ewe/V")?);
        table.current.push(value(current_col, "I/mA")? / 1000.0);
        if let (Some(col), Some(out)) = (technique_col, table.technique.as_mut()) {
            out.push(value(col, "ox/red")?.round() as i64);
        }
        if let (Some(col), Some(out)) = (sequence_col, table.sequence.as_mut()) {
            out.push(value(col, "Ns")?.round() as u32);
        }
    }
    Ok(table)
}

/// Build a record from a row range, shifting its time axis to start at zero
fn slice_record(
    file: &Path,
    table: &Table,
    range: std::ops::Range<usize>,
    branch: Branch,
    start: NaiveDateTime,
    name: String,
) -> Result<RawHalfCycle, FormatError> {
    let t0 = table.time[range.start];
    let time = table.time[range.clone()].iter().map(|t| t - t0).collect();
    let mut source = SourceInfo::new(file, Instrument::Biologic);
    source.name = name;
    source.timestamp = Some(
        offset(start, t0).ok_or_else(|| FormatError::malformed(file, format!("sample time {} s is out of range", t0)))?,
    );
    RawHalfCycle::new(
        time,
        table.current[range.clone()].to_vec(),
        table.voltage[range].to_vec(),
        branch,
        source,
    )
}

/// Parse a cycling MPT file into ordered half-cycles.
///
/// Each loop is split independently by `splitter`; every half-cycle's time starts
/// at zero and its timestamp is the acquisition start plus its first sample time.
pub fn parse_cycling(
    file: &Path,
    text: &str,
    splitter: &dyn HalfCycleSplitter,
) -> Result<Vec<RawHalfCycle>, FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    let preamble = read_preamble(file, &lines)?;
    let table = read_table(file, &lines, preamble.header_idx)?;
    let start = acquisition_start(file, preamble.acquisition, table.separator)?;

    let nrows = table.time.len();
    let loops = if preamble.loops.is_empty() {
        vec![(0, nrows - 1)]
    } else {
        preamble.loops.clone()
    };

    let rows: Vec<SplitRow> = (0..nrows)
        .map(|k| SplitRow {
            time: table.time[k],
            current: table.current[k],
            technique: table.technique.as_ref().map(|t| t[k]),
        })
        .collect();

    let file_name = SourceInfo::new(file, Instrument::Biologic).name;
    let mut records = Vec::new();
    for (loop_idx, &(first, last)) in loops.iter().enumerate() {
        if first > last || last >= nrows {
            return Err(FormatError::malformed(
                file,
                format!("loop {} spans rows {}..={} of a {}-row table", loop_idx, first, last, nrows),
            ));
        }
        let block = &rows[first..=last];
        let segments = splitter
            .split(block)
            .map_err(|reason| FormatError::malformed(file, format!("loop {}: {}", loop_idx, reason)))?;
        for segment in segments {
            if segment.range.start >= segment.range.end || segment.range.end > block.len() {
                return Err(FormatError::malformed(
                    file,
                    format!("{} splitter returned an invalid row range {:?}", splitter.name(), segment.range),
                ));
            }
            let range = first + segment.range.start..first + segment.range.end;
            let name = format!("{} loop {} {}", file_name, loop_idx, segment.branch);
            records.push(slice_record(file, &table, range, segment.branch, start, name)?);
        }
    }

    debug!(
        "Parsed Biologic cycling file {} into {} half-cycles ({} splitter)",
        file.display(),
        records.len(),
        splitter.name()
    );
    Ok(records)
}

fn keyword<'a, 'p>(file: &Path, preamble: &'p Preamble<'a>, name: &str) -> Result<&'p [&'a str], FormatError> {
    preamble
        .keywords
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| FormatError::malformed(file, format!("battery-module header line '{}' not found", name)))
}

/// Parse a battery-module MPT file into per-sequence segments.
///
/// Sequences whose `ctrl_type` is `Loop` carry no data and are skipped. Data rows
/// are cut wherever the `Ns` column changes.
pub fn parse_battery_module(file: &Path, text: &str) -> Result<BatteryModule, FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    let preamble = read_preamble(file, &lines)?;

    let sequences = keyword(file, &preamble, "Ns")?;
    let ctrl_types = keyword(file, &preamble, "ctrl_type")?;
    let values = keyword(file, &preamble, "ctrl1_val")?;
    let directions = keyword(file, &preamble, "charge/discharge")?;
    let units = preamble.keywords.get("ctrl1_val_unit");

    let separator = if values.iter().any(|v| v.contains(',')) {
        DecimalSeparator::Comma
    } else {
        DecimalSeparator::Dot
    };

    let mut described: HashMap<u32, (Branch, f64)> = HashMap::new();
    for (k, (((ns, ctrl), value), direction)) in sequences
        .iter()
        .zip(ctrl_types)
        .zip(values)
        .zip(directions)
        .enumerate()
    {
        if ctrl.eq_ignore_ascii_case("loop") {
            continue;
        }
        let ns: u32 = ns
            .parse()
            .map_err(|_| FormatError::malformed(file, format!("invalid sequence number '{}'", ns)))?;
        let branch = match direction.to_ascii_lowercase().as_str() {
            "charge" => Branch::Charge,
            "discharge" => Branch::Discharge,
            other => {
                return Err(FormatError::malformed(
                    file,
                    format!("sequence {}: unknown direction '{}'", ns, other),
                ))
            }
        };
        let mut current = separator
            .parse(value)
            .ok_or_else(|| FormatError::malformed(file, format!("sequence {}: invalid current '{}'", ns, value)))?;
        if units.and_then(|u| u.get(k)).is_some_and(|u| u.eq_ignore_ascii_case("ma")) {
            current /= 1000.0;
        }
        described.insert(ns, (branch, current.abs()));
    }

    let table = read_table(file, &lines, preamble.header_idx)?;
    let start = acquisition_start(file, preamble.acquisition, separator)?;
    let tags = table
        .sequence
        .as_ref()
        .ok_or_else(|| FormatError::malformed(file, "table has no 'Ns' column"))?;

    let file_name = SourceInfo::new(file, Instrument::Biologic).name;
    let mut segments = Vec::new();
    let mut begin = 0;
    for end in 1..=tags.len() {
        if end < tags.len() && tags[end] == tags[begin] {
            continue;
        }
        let ns = tags[begin];
        let (branch, current) = *described.get(&ns).ok_or_else(|| {
            FormatError::malformed(file, format!("data rows refer to sequence {} missing from the header", ns))
        })?;
        let name = format!("{} Ns {} {}", file_name, ns, branch);
        let record = slice_record(file, &table, begin..end, branch, start, name)?;
        segments.push(ModuleSegment {
            sequence: ns,
            current,
            record,
        });
        begin = end;
    }

    debug!(
        "Parsed Biologic battery module {} into {} segments",
        file.display(),
        segments.len()
    );
    Ok(BatteryModule {
        timestamp: start,
        segments,
    })
}
