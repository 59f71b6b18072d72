use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::numeric::DecimalSeparator;
use super::FormatError;

/// One pre-aggregated cycle of a rate-test summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTableRow {
    /// Cycle index as written in the file
    pub cycle: u32,
    /// Applied current
    pub current: f64,
    /// Discharge capacity
    pub discharge_capacity: Option<f64>,
    /// Charge capacity
    pub charge_capacity: Option<f64>,
    /// Coulombic efficiency (fraction)
    pub coulomb_efficiency: Option<f64>,
    /// Energy efficiency (fraction)
    pub energy_efficiency: Option<f64>,
    /// Voltaic efficiency (fraction)
    pub voltage_efficiency: Option<f64>,
}

/// Generic rate-test summary: one row per cycle, in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// Rows in file order
    pub rows: Vec<RateTableRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Cycle,
    Current,
    DischargeCapacity,
    ChargeCapacity,
    CoulombEfficiency,
    EnergyEfficiency,
    VoltageEfficiency,
}

impl Field {
    fn classify(header: &str) -> Option<Self> {
        match header {
            h if h.contains("coulomb") => Some(Self::CoulombEfficiency),
            h if h.contains("energy") && h.contains("eff") => Some(Self::EnergyEfficiency),
            h if h.contains("volt") && h.contains("eff") => Some(Self::VoltageEfficiency),
            h if h.contains("discharge") && h.contains("capacity") => Some(Self::DischargeCapacity),
            h if h.contains("charge") && h.contains("capacity") => Some(Self::ChargeCapacity),
            h if h.contains("cycle") => Some(Self::Cycle),
            h if h.contains("current") => Some(Self::Current),
            _ => None,
        }
    }
}

fn sniff_delimiter(header: &str) -> u8 {
    [b'\t', b';', b',']
        .into_iter()
        .max_by_key(|d| header.bytes().filter(|b| b == d).count())
        .unwrap_or(b',')
}

impl RateTable {
    /// Parse a delimited rate-test summary table.
    ///
    /// The delimiter is sniffed among tab, semicolon and comma. Column headers are
    /// matched case-insensitively; cycle, current and discharge capacity must be
    /// present. Headers containing `%` are scaled to fractions.
    pub fn parse(file: &Path, text: &str) -> Result<Self, FormatError> {
        let header_line = text
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| FormatError::malformed(file, "rate table is empty"))?;
        let delimiter = sniff_delimiter(header_line);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let csv_err = |source| FormatError::Csv {
            file: file.to_path_buf(),
            source,
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let mut columns: Vec<(usize, Field, f64)> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = Field::classify(header) {
                if columns.iter().any(|(_, f, _)| *f == field) {
                    continue;
                }
                let scale = if header.contains('%') { 0.01 } else { 1.0 };
                columns.push((idx, field, scale));
            }
        }
        for (required, name) in [
            (Field::Cycle, "cycle"),
            (Field::Current, "current"),
            (Field::DischargeCapacity, "discharge capacity"),
        ] {
            if !columns.iter().any(|(_, f, _)| *f == required) {
                return Err(FormatError::malformed(file, format!("missing required column: {}", name)));
            }
        }

        let mut rows = Vec::new();
        for (k, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let mut cycle = None;
            let mut current = None;
            let mut row = RateTableRow {
                cycle: 0,
                current: 0.0,
                discharge_capacity: None,
                charge_capacity: None,
                coulomb_efficiency: None,
                energy_efficiency: None,
                voltage_efficiency: None,
            };
            for &(idx, field, scale) in &columns {
                let raw = record.get(idx).unwrap_or_default();
                if raw.is_empty() {
                    continue;
                }
                let separator = if delimiter == b',' {
                    DecimalSeparator::Dot
                } else {
                    DecimalSeparator::detect(raw)
                };
                let value = separator
                    .parse(raw)
                    .ok_or_else(|| FormatError::malformed(file, format!("row {}: non-numeric value '{}'", k, raw)))?
                    * scale;
                match field {
                    Field::Cycle => cycle = Some(value),
                    Field::Current => current = Some(value),
                    Field::DischargeCapacity => row.discharge_capacity = Some(value),
                    Field::ChargeCapacity => row.charge_capacity = Some(value),
                    Field::CoulombEfficiency => row.coulomb_efficiency = Some(value),
                    Field::EnergyEfficiency => row.energy_efficiency = Some(value),
                    Field::VoltageEfficiency => row.voltage_efficiency = Some(value),
                }
            }
            let cycle = cycle.ok_or_else(|| FormatError::malformed(file, format!("row {}: empty cycle index", k)))?;
            if cycle < 0.0 || cycle.fract() != 0.0 {
                return Err(FormatError::malformed(file, format!("row {}: invalid cycle index {}", k, cycle)));
            }
            row.cycle = cycle as u32;
            row.current = current.ok_or_else(|| FormatError::malformed(file, format!("row {}: empty current", k)))?;
            rows.push(row);
        }

        debug!("Parsed rate table {} with {} rows", file.display(), rows.len());
        Ok(Self { rows })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Partition the rows into consecutive runs of equal applied current
    pub fn steps(&self) -> Vec<(f64, &[RateTableRow])> {
        let mut steps = Vec::new();
        let mut begin = 0;
        for end in 1..=self.rows.len() {
            if end < self.rows.len() && self.rows[end].current == self.rows[begin].current {
                continue;
            }
            steps.push((self.rows[begin].current, &self.rows[begin..end]));
            begin = end;
        }
        steps
    }
}
