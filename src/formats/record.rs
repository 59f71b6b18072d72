use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{FormatError, Instrument};

/// Direction of a half-cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// Current flowing into the cell
    Charge,
    /// Current flowing out of the cell
    Discharge,
}

impl Branch {
    /// Branch implied by the sign of a current value. Zero has no branch.
    pub fn from_current(current: f64) -> Option<Self> {
        if current > 0.0 {
            Some(Self::Charge)
        } else if current < 0.0 {
            Some(Self::Discharge)
        } else {
            None
        }
    }

    /// The opposite branch
    pub fn opposite(self) -> Self {
        match self {
            Self::Charge => Self::Discharge,
            Self::Discharge => Self::Charge,
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Charge => write!(f, "charge"),
            Self::Discharge => write!(f, "discharge"),
        }
    }
}

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Display name (file name, or file name plus segment label)
    pub name: String,
    /// Path of the source file
    pub path: PathBuf,
    /// Instrument family that produced the file
    pub instrument: Instrument,
    /// Acquisition timestamp of the first sample
    pub timestamp: Option<NaiveDateTime>,
    /// Ambient temperature in °C, if the instrument recorded one
    pub temperature: Option<f64>,
}

impl SourceInfo {
    /// Create source info for a file with no timestamp or temperature yet
    pub fn new(path: impl Into<PathBuf>, instrument: Instrument) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            instrument,
            timestamp: None,
            temperature: None,
        }
    }
}

/// One normalized charge or discharge branch as read from an instrument file.
///
/// Time is in seconds, current in amperes and voltage in volts. The three series
/// always have the same, non-zero length, time never decreases and every value is
/// finite. [`RawHalfCycle::new`] enforces this.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHalfCycle {
    time: Vec<f64>,
    current: Vec<f64>,
    voltage: Vec<f64>,
    branch: Branch,
    source: SourceInfo,
}

impl RawHalfCycle {
    /// Validate the sample series and build a record.
    ///
    /// The current is sign-normalized against `branch` (see
    /// [`normalize_sign`](Self::normalize_sign)).
    pub fn new(
        time: Vec<f64>,
        current: Vec<f64>,
        voltage: Vec<f64>,
        branch: Branch,
        source: SourceInfo,
    ) -> Result<Self, FormatError> {
        let file = source.path.clone();
        if time.is_empty() {
            return Err(FormatError::malformed(file, format!("{} record has no samples", branch)));
        }
        if time.len() != current.len() || time.len() != voltage.len() {
            return Err(FormatError::malformed(
                file,
                format!(
                    "series length mismatch: time={}, current={}, voltage={}",
                    time.len(),
                    current.len(),
                    voltage.len()
                ),
            ));
        }
        if let Some(k) = time
            .iter()
            .chain(&current)
            .chain(&voltage)
            .position(|v| !v.is_finite())
        {
            return Err(FormatError::malformed(
                file,
                format!("non-finite value at sample {}", k % time.len()),
            ));
        }
        if let Some(k) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(FormatError::malformed(
                file,
                format!(
                    "time decreases at sample {} ({} s after {} s)",
                    k + 1,
                    time[k + 1],
                    time[k]
                ),
            ));
        }

        let record = Self {
            time,
            current,
            voltage,
            branch,
            source,
        };
        Ok(record.normalize_sign())
    }

    /// Sample times in seconds
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Sample currents in amperes, sign-normalized to the branch
    pub fn current(&self) -> &[f64] {
        &self.current
    }

    /// Sample voltages in volts
    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    /// Charge or discharge
    pub fn branch(&self) -> Branch {
        self.branch
    }

    /// Source metadata
    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    /// Acquisition timestamp of the first sample
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.source.timestamp
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false for a validated record; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Signed trapezoidal integral of current over time, in A·s
    pub fn net_charge(&self) -> f64 {
        self.time
            .windows(2)
            .zip(self.current.windows(2))
            .map(|(t, i)| 0.5 * (i[0] + i[1]) * (t[1] - t[0]))
            .sum()
    }

    /// Flip the current sign when its net integral disagrees with the branch.
    ///
    /// Charge must integrate positive and discharge negative. A zero integral is
    /// left as is.
    pub fn normalize_sign(mut self) -> Self {
        let net = self.net_charge();
        let flip = match self.branch {
            Branch::Charge => net < 0.0,
            Branch::Discharge => net > 0.0,
        };
        if flip {
            debug!(
                "Negating current of {} record from {} (net charge {:.6e} A·s)",
                self.branch, self.source.name, net
            );
            self.current.iter_mut().for_each(|i| *i = -*i);
        }
        self
    }

    /// Move the sample series out of the record: `(time, current, voltage, branch, source)`
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, Vec<f64>, Branch, SourceInfo) {
        (self.time, self.current, self.voltage, self.branch, self.source)
    }
}
