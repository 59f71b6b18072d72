use serde::{Deserialize, Serialize};

use crate::cycles::Units;
use crate::formats::ParseOptions;

/// Name of the reserved per-step subfolder holding the half-cycle files
pub const DEFAULT_RESERVED_FOLDER: &str = "CHARGE_DISCHARGE";

/// How the files of one fetch call are ordered before their records are appended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchOrder {
    /// Sequence number encoded in the file name when every file has one
    /// (charge before discharge on ties), otherwise lexicographic path order
    #[default]
    FileName,
    /// Acquisition timestamp of each record; records without one go last
    Timestamp,
}

/// Configuration for a [`FileManager`](super::FileManager) session
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Units for derived charge and energy
    pub units: Units,
    /// Reject one-sided cycles other than a terminal charge
    pub strict_pairing: bool,
    /// Join consecutive same-branch records into one half-cycle before pairing
    pub merge_partial: bool,
    /// Ordering applied within each fetch call
    pub order: FetchOrder,
    /// Options forwarded to the format parsers
    pub parse_options: ParseOptions,
    /// Name of the reserved charge/discharge subfolder (matched case-insensitively)
    pub reserved_folder: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            units: Units::default(),
            strict_pairing: false,
            merge_partial: false,
            order: FetchOrder::default(),
            parse_options: ParseOptions::default(),
            reserved_folder: DEFAULT_RESERVED_FOLDER.to_string(),
        }
    }
}

impl ManagerConfig {
    /// Set the reporting units
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Enable or disable strict pairing
    pub fn with_strict_pairing(mut self, strict: bool) -> Self {
        self.strict_pairing = strict;
        self
    }

    /// Enable or disable merging of partial half-cycles
    pub fn with_merge_partial(mut self, merge: bool) -> Self {
        self.merge_partial = merge;
        self
    }

    /// Set the fetch ordering
    pub fn with_order(mut self, order: FetchOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the parser options
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Set the reserved subfolder name
    pub fn with_reserved_folder(mut self, name: impl Into<String>) -> Self {
        self.reserved_folder = name.into();
        self
    }
}
