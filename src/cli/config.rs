//! TOML configuration file support.
//!
//! Ingestion settings can live in a config file instead of CLI flags:
//!
//! ```toml
//! # voltcycle.toml
//! [ingest]
//! strict_pairing = false
//! merge_partial = true
//! order = "timestamp"
//! instrument = "gamry"
//! splitter = "current-sign"
//! reserved_folder = "CHARGE_DISCHARGE"
//!
//! [ingest.units]
//! charge = "Ah"
//! energy = "Wh"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use voltcycle::cycles::Units;
use voltcycle::formats::{CurrentSignSplitter, Instrument, TechniqueColumnSplitter};
use voltcycle::manager::{FetchOrder, ManagerConfig};

/// Root configuration structure for voltcycle.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// How multi-half-cycle tables are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitterChoice {
    /// Explicit `ox/red` technique column.
    TechniqueColumn,
    /// Sign of the current.
    CurrentSign,
}

/// Configuration for File Manager sessions.
#[derive(Debug, Default, Deserialize)]
pub struct IngestConfig {
    /// Reporting units.
    pub units: Option<Units>,

    /// Reject one-sided cycles other than a terminal charge.
    pub strict_pairing: Option<bool>,

    /// Join consecutive same-branch records before pairing.
    pub merge_partial: Option<bool>,

    /// Ordering within one fetch call.
    pub order: Option<FetchOrder>,

    /// Force a parser.
    pub instrument: Option<Instrument>,

    /// Half-cycle splitting strategy for Biologic tables.
    pub splitter: Option<SplitterChoice>,

    /// Reserved charge/discharge subfolder name.
    pub reserved_folder: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load `path` if given, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}

impl IngestConfig {
    /// Overlay the settings present in the file onto `base`.
    pub fn apply(&self, mut base: ManagerConfig) -> ManagerConfig {
        if let Some(units) = self.units {
            base.units = units;
        }
        if let Some(strict) = self.strict_pairing {
            base.strict_pairing = strict;
        }
        if let Some(merge) = self.merge_partial {
            base.merge_partial = merge;
        }
        if let Some(order) = self.order {
            base.order = order;
        }
        if let Some(instrument) = self.instrument {
            base.parse_options.instrument = Some(instrument);
        }
        match self.splitter {
            Some(SplitterChoice::CurrentSign) => {
                base.parse_options.splitter = Some(Arc::new(CurrentSignSplitter::default()));
            }
            Some(SplitterChoice::TechniqueColumn) => {
                base.parse_options.splitter = Some(Arc::new(TechniqueColumnSplitter));
            }
            None => {}
        }
        if let Some(folder) = &self.reserved_folder {
            base.reserved_folder = folder.clone();
        }
        base
    }
}
