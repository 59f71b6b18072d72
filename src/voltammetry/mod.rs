//! # Cyclic voltammetry
//!
//! Reads a voltammogram from Gamry `.DTA`, Biologic `.mpt` or CH Instruments
//! `.txt` output and splits it into numbered cycles.
//!
//! ```rust,no_run
//! use voltcycle::voltammetry::CyclicVoltammetry;
//!
//! let cv = CyclicVoltammetry::from_file("ferrocene.DTA")?;
//! println!("{} cycles at {:?} mV/s", cv.len(), cv.settings.scan_rate);
//! for cycle in cv.iter() {
//!     println!("cycle {}: {} points", cycle.number, cycle.voltage.len());
//! }
//! # Ok::<(), voltcycle::formats::FormatError>(())
//! ```


use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::formats::numeric::DecimalSeparator;
use crate::formats::FormatError;

/// Instrument family of a voltammogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CvFormat {
    /// Gamry `.DTA`
    Gamry,
    /// Biologic `.mpt`
    Biologic,
    /// CH Instruments `.txt`
    ChInstruments,
}

impl CvFormat {
    /// Format for a file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "dta" => Some(Self::Gamry),
            "mpt" => Some(Self::Biologic),
            "txt" => Some(Self::ChInstruments),
            _ => None,
        }
    }
}

impl fmt::Display for CvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gamry => "Gamry",
            Self::Biologic => "Biologic",
            Self::ChInstruments => "CH Instruments",
        })
    }
}

/// Scan parameters read from the file header
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CvSettings {
    /// Scan rate as written by the instrument (mV/s for Gamry)
    pub scan_rate: Option<f64>,
    /// Starting potential in V
    pub initial_voltage: Option<f64>,
    /// Turning potential in V
    pub final_voltage: Option<f64>,
}

/// One numbered cycle of a voltammogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvCycle {
    /// Cycle number, 0-based
    pub number: usize,
    /// Time in s, when the instrument records it
    pub time: Option<Vec<f64>>,
    /// Potential in V
    pub voltage: Vec<f64>,
    /// Current in A
    pub current: Vec<f64>,
}

impl CvCycle {
    fn new(number: usize, timed: bool) -> Self {
        Self {
            number,
            time: timed.then(Vec::new),
            voltage: Vec::new(),
            current: Vec::new(),
        }
    }

    fn push(&mut self, time: Option<f64>, voltage: f64, current: f64) {
        if let (Some(series), Some(t)) = (self.time.as_mut(), time) {
            series.push(t);
        }
        self.voltage.push(voltage);
        self.current.push(current);
    }
}

/// A voltammogram split into cycles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CyclicVoltammetry {
    /// File name
    pub name: String,
    /// Instrument family
    pub format: CvFormat,
    /// Header settings
    pub settings: CvSettings,
    /// Cycles in ascending number
    pub cycles: Vec<CvCycle>,
}

/// Collects samples by cycle number
struct CycleSink {
    timed: bool,
    cycles: BTreeMap<usize, CvCycle>,
}

impl CycleSink {
    fn new(timed: bool) -> Self {
        Self {
            timed,
            cycles: BTreeMap::new(),
        }
    }

    fn push(&mut self, number: usize, time: Option<f64>, voltage: f64, current: f64) {
        let timed = self.timed;
        self.cycles
            .entry(number)
            .or_insert_with(|| CvCycle::new(number, timed))
            .push(time, voltage, current);
    }

    fn finish(self, file: &Path) -> Result<Vec<CvCycle>, FormatError> {
        if self.cycles.is_empty() {
            return Err(FormatError::malformed(file, "no voltammetry data rows"));
        }
        Ok(self.cycles.into_values().collect())
    }
}

/// Header number in either decimal convention
fn header_number(field: &str) -> Option<f64> {
    DecimalSeparator::detect(field).parse(field)
}

fn column(file: &Path, names: &[&str], wanted: &[&str]) -> Result<usize, FormatError> {
    names
        .iter()
        .position(|n| wanted.contains(&n.trim()))
        .ok_or_else(|| FormatError::malformed(file, format!("missing column '{}'", wanted[0])))
}

fn field(file: &Path, fields: &[&str], idx: usize, sep: DecimalSeparator, row: usize) -> Result<f64, FormatError> {
    fields
        .get(idx)
        .and_then(|f| sep.parse(f))
        .ok_or_else(|| FormatError::malformed(file, format!("row {}: invalid or missing value in column {}", row, idx)))
}

fn read_gamry(file: &Path, text: &str) -> Result<(CvSettings, Vec<CvCycle>), FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    let mut settings = CvSettings::default();
    let mut limits = (None, None);
    for line in &lines {
        let fields: Vec<&str> = line.split('\t').collect();
        let value = fields.get(2).and_then(|v| header_number(v));
        match fields[0] {
            "SCANRATE" => settings.scan_rate = value,
            "VINIT" => settings.initial_voltage = value,
            "VLIMIT1" => limits.0 = value,
            "VLIMIT2" => limits.1 = value,
            _ => {}
        }
    }
    if let (Some(v1), Some(v2)) = limits {
        settings.final_voltage = Some(if settings.initial_voltage == Some(v1) { v2 } else { v1 });
    }

    let mut sink = CycleSink::new(true);
    let mut table = 0;
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        idx += 1;
        let is_curve = line.starts_with("CURVE") && line.split('\t').nth(1) == Some("TABLE");
        if !is_curve {
            continue;
        }
        let names: Vec<&str> = lines
            .get(idx)
            .ok_or_else(|| FormatError::malformed(file, "CURVE table has no column row"))?
            .split('\t')
            .collect();
        idx += 2;
        let t = column(file, &names, &["T"])?;
        let v = column(file, &names, &["Vf"])?;
        let i = column(file, &names, &["Im"])?;
        let cycle = names.iter().position(|n| n.trim() == "Cycle");

        let mut sep = None;
        while idx < lines.len() && lines[idx].starts_with('\t') {
            let fields: Vec<&str> = lines[idx].split('\t').collect();
            let sep = *sep.get_or_insert_with(|| DecimalSeparator::detect(fields.get(i).copied().unwrap_or("")));
            let number = match cycle {
                Some(c) => field(file, &fields, c, sep, idx)? as usize,
                None => table,
            };
            sink.push(
                number,
                Some(field(file, &fields, t, sep, idx)?),
                field(file, &fields, v, sep, idx)?,
                field(file, &fields, i, sep, idx)?,
            );
            idx += 1;
        }
        table += 1;
    }
    Ok((settings, sink.finish(file)?))
}

fn read_biologic(file: &Path, text: &str) -> Result<(CvSettings, Vec<CvCycle>), FormatError> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
    let mut settings = CvSettings::default();
    let header = lines
        .iter()
        .position(|l| l.starts_with("mode\t"))
        .ok_or_else(|| FormatError::malformed(file, "table header starting with 'mode' not found"))?;
    for line in &lines[..header] {
        let value = line.split_whitespace().nth(2).and_then(header_number);
        if line.starts_with("Ei (V)") {
            settings.initial_voltage = value;
        } else if line.starts_with("E1 (V)") {
            settings.final_voltage = value;
        }
    }

    let names: Vec<&str> = lines[header].split('\t').collect();
    let t = column(file, &names, &["time/s"])?;
    let v = column(file, &names, &["Ewe/V"])?;
    let i = column(file, &names, &["<I>/mA", "I/mA"])?;
    let c = column(file, &names, &["cycle number"])?;

    let mut sink = CycleSink::new(true);
    let mut sep = None;
    for (offset, line) in lines[header + 1..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row = header + 1 + offset;
        let fields: Vec<&str> = line.split('\t').collect();
        let sep = *sep.get_or_insert_with(|| DecimalSeparator::detect(fields.get(v).copied().unwrap_or("")));
        let number = field(file, &fields, c, sep, row)?.round().max(1.0) as usize - 1;
        sink.push(
            number,
            Some(field(file, &fields, t, sep, row)?),
            field(file, &fields, v, sep, row)?,
            field(file, &fields, i, sep, row)? / 1000.0,
        );
    }
    Ok((settings, sink.finish(file)?))
}

fn read_ch_instruments(file: &Path, text: &str) -> Result<(CvSettings, Vec<CvCycle>), FormatError> {
    let mut settings = CvSettings::default();
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
    let header_value = |line: &str| line.split('=').nth(1).and_then(|v| v.trim().parse().ok());

    let mut found = false;
    for line in lines.by_ref() {
        if line.contains("High E") {
            settings.initial_voltage = header_value(line);
        } else if line.contains("Low E") {
            settings.final_voltage = header_value(line);
        } else if line.contains("Potential/V, Current/A") {
            found = true;
            break;
        }
    }
    if !found {
        return Err(FormatError::malformed(file, "'Potential/V, Current/A' header not found"));
    }

    let mut samples = Vec::new();
    for (row, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let voltage = field(file, &fields, 0, DecimalSeparator::Dot, row)?;
        let current = field(file, &fields, 1, DecimalSeparator::Dot, row)?;
        samples.push((voltage, current));
    }

    let mut sink = CycleSink::new(false);
    let mut rising = true;
    let mut switches = 0;
    for k in 0..samples.len() {
        let diff = match k {
            0 => samples.get(1).map_or(0.0, |next| next.0 - samples[0].0),
            _ => samples[k].0 - samples[k - 1].0,
        };
        if (diff > 0.0) != rising {
            rising = diff > 0.0;
            switches += 1;
        }
        sink.push(switches / 2, None, samples[k].0, samples[k].1);
    }
    debug!("{}: {} scan direction switches", file.display(), switches);
    Ok((settings, sink.finish(file)?))
}

impl CyclicVoltammetry {
    /// Read a voltammogram from disk, picking the reader from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let format = CvFormat::from_extension(path)
            .ok_or_else(|| FormatError::unsupported(path, "voltammetry files must be .DTA, .mpt or .txt"))?;
        let bytes = std::fs::read(path).map_err(|source| FormatError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &bytes, format)
    }

    /// Read a voltammogram from an in-memory buffer
    pub fn from_bytes<P: AsRef<Path>>(name: P, bytes: &[u8], format: CvFormat) -> Result<Self, FormatError> {
        let file = name.as_ref();
        let text = String::from_utf8_lossy(bytes);
        let (settings, cycles) = match format {
            CvFormat::Gamry => read_gamry(file, &text)?,
            CvFormat::Biologic => read_biologic(file, &text)?,
            CvFormat::ChInstruments => read_ch_instruments(file, &text)?,
        };
        debug!("Read {} voltammogram {} with {} cycles", format, file.display(), cycles.len());
        Ok(Self {
            name: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            format,
            settings,
            cycles,
        })
    }

    /// Number of cycles
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// Whether there are no cycles
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Cycle with number `number`
    pub fn get(&self, number: usize) -> Option<&CvCycle> {
        self.cycles.iter().find(|c| c.number == number)
    }

    /// Iterate over the cycles in ascending number
    pub fn iter(&self) -> std::slice::Iter<'_, CvCycle> {
        self.cycles.iter()
    }

    /// Current density in mA/cm² of every cycle for an electrode area in cm²
    pub fn current_density(&self, area: f64) -> Vec<Vec<f64>> {
        self.cycles
            .iter()
            .map(|c| c.current.iter().map(|i| i * 1000.0 / area).collect())
            .collect()
    }

    /// Lowest and highest potential over all cycles
    pub fn potential_window(&self) -> Option<(f64, f64)> {
        self.cycles
            .iter()
            .flat_map(|c| c.voltage.iter().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl<'a> IntoIterator for &'a CyclicVoltammetry {
    type Item = &'a CvCycle;
    type IntoIter = std::slice::Iter<'a, CvCycle>;

    fn into_iter(self) -> Self::IntoIter {
        self.cycles.iter()
    }
}
