//! # File Manager
//!
//! A [`FileManager`] is an explicit ingestion session. It discovers files, hands
//! them to the format parsers and accumulates the raw half-cycle records in fetch
//! order. It then pairs them into [`Cycle`]s and a [`CellCycling`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use voltcycle::manager::{FileManager, ManagerConfig};
//!
//! let mut manager = FileManager::with_config(ManagerConfig::default().with_merge_partial(true));
//! let report = manager.fetch_from_folder("data/CHARGE_DISCHARGE", "DTA")?;
//! println!("{}", report);
//!
//! let cycling = manager.build_cellcycling()?;
//! println!("{}", cycling);
//! # Ok::<(), voltcycle::manager::ManagerError>(())
//! ```
//!
//! ## Batch policy
//!
//! The batch operations (`fetch`, `fetch_from_folder`, `fetch_gamry_folder_tree`)
//! keep going when a file fails. Each failure is logged and collected in the
//! returned [`FetchReport`]; call [`FetchReport::into_result`] for all-or-nothing
//! behavior. [`FileManager::fetch_file`] returns the parser error directly.

mod config;
mod error;
mod ordering;
pub mod pairing;
pub mod tree;

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub use config::{FetchOrder, ManagerConfig, DEFAULT_RESERVED_FOLDER};
pub use error::ManagerError;
pub use ordering::sequence_number;
pub use pairing::{group_consecutive, pair_sequential, PairingOptions};
pub use tree::{discover_gamry_tree, parse_step_current, StepFolder};

use crate::cycles::{CellCycling, Cycle};
use crate::formats::{self, FormatError, ParsedContent, RawHalfCycle};

/// A file that failed during a batch fetch
#[derive(Debug)]
pub struct FileFailure {
    /// The file
    pub path: PathBuf,
    /// Why it failed
    pub error: FormatError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Outcome of a batch fetch
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Files parsed and appended
    pub loaded: Vec<PathBuf>,
    /// Records appended to the session
    pub records: usize,
    /// Files that failed, in attempt order
    pub failed: Vec<FileFailure>,
}

impl FetchReport {
    /// Whether every file attempted was loaded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of files attempted
    pub fn attempted(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: FetchReport) {
        self.loaded.extend(other.loaded);
        self.records += other.records;
        self.failed.extend(other.failed);
    }

    /// Turn any failure into [`ManagerError::BatchFailed`]
    pub fn into_result(self) -> Result<Self, ManagerError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(ManagerError::BatchFailed {
                failed: self.failed.len(),
                total: self.attempted(),
                failures: self.failed,
            })
        }
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Fetched {} of {} files ({} records)",
            self.loaded.len(),
            self.attempted(),
            self.records
        )?;
        for failure in &self.failed {
            writeln!(f, "  failed: {}", failure)?;
        }
        Ok(())
    }
}

/// An ingestion session over raw half-cycle records
#[derive(Debug, Default)]
pub struct FileManager {
    config: ManagerConfig,
    records: Vec<RawHalfCycle>,
}

impl FileManager {
    /// Create a session with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a custom configuration
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn load(&self, path: &Path) -> Result<Vec<RawHalfCycle>, FormatError> {
        let parsed = formats::parse_file(path, &self.config.parse_options)?;
        match parsed.content {
            ParsedContent::HalfCycles(records) => {
                debug!("{}: {} half-cycle records", path.display(), records.len());
                Ok(records)
            }
            ParsedContent::RateSummary(_) => Err(FormatError::unsupported(
                path,
                "rate-summary tables carry no time series; use RateExperiment::from_rate_table",
            )),
        }
    }

    /// Parse one file and append its records. Returns the number appended.
    pub fn fetch_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, ManagerError> {
        let path = path.as_ref();
        let records = self.load(path).map_err(|source| ManagerError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        let count = records.len();
        self.records.extend(records);
        Ok(count)
    }

    /// Parse a batch of files, order them and append their records
    pub fn fetch<I, P>(&mut self, paths: I) -> FetchReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = FetchReport::default();
        let mut batch = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match self.load(path) {
                Ok(records) => batch.push((path.to_path_buf(), records)),
                Err(error) => {
                    warn!("Skipping {}: {}", path.display(), error);
                    report.failed.push(FileFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        report.loaded = batch.iter().map(|(path, _)| path.clone()).collect();
        report.loaded.sort();
        let ordered = ordering::order_batch(batch, self.config.order);
        report.records = ordered.len();
        self.records.extend(ordered);

        info!(
            "Fetched {} records from {} files ({} failed)",
            report.records,
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    /// Fetch every file in `folder` whose extension matches `extension`.
    ///
    /// The match is case-insensitive and a leading dot is optional.
    pub fn fetch_from_folder<P: AsRef<Path>>(
        &mut self,
        folder: P,
        extension: &str,
    ) -> Result<FetchReport, ManagerError> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(ManagerError::InvalidFolder(folder.to_path_buf()));
        }
        let wanted = extension.trim_start_matches('.');
        let io = |source| ManagerError::Io {
            path: folder.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(folder).map_err(io)? {
            let path = entry.map_err(io)?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        debug!("{}: {} .{} files", folder.display(), files.len(), wanted);
        Ok(self.fetch(files))
    }

    /// Fetch every step of a Gamry folder tree, appending the steps in folder order
    pub fn fetch_gamry_folder_tree<P: AsRef<Path>>(&mut self, base: P) -> Result<FetchReport, ManagerError> {
        let steps = tree::discover_gamry_tree(base.as_ref(), &self.config.reserved_folder)?;
        let mut report = FetchReport::default();
        for step in steps {
            info!("Step {} A: {}", step.current, step.data_folder.display());
            report.merge(self.fetch_from_folder(&step.data_folder, "dta")?);
        }
        Ok(report)
    }

    /// Records in session order
    pub fn records(&self) -> &[RawHalfCycle] {
        &self.records
    }

    /// Number of records in the session
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the session holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record and start over
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Groups of consecutive same-branch record indices.
    ///
    /// Groups longer than one are partial half-cycles that `merge_partial` would join.
    pub fn suggest_ordering(&self) -> Vec<Vec<usize>> {
        pairing::group_consecutive(&self.records)
    }

    fn pairing_options(&self) -> PairingOptions {
        PairingOptions {
            strict: self.config.strict_pairing,
            merge_partial: self.config.merge_partial,
            units: self.config.units,
        }
    }

    /// Pair the session's records into cycles without consuming the session
    pub fn build_cycles(&self) -> Result<Vec<Cycle>, ManagerError> {
        if self.records.is_empty() {
            return Err(ManagerError::EmptySession);
        }
        pair_sequential(self.records.clone(), &self.pairing_options())
    }

    /// Build a [`CellCycling`] from the session
    pub fn build_cellcycling(&self) -> Result<CellCycling, ManagerError> {
        Ok(CellCycling::new(self.build_cycles()?)?)
    }

    /// Build a [`CellCycling`], consuming the session
    pub fn into_cellcycling(self) -> Result<CellCycling, ManagerError> {
        if self.records.is_empty() {
            return Err(ManagerError::EmptySession);
        }
        let options = self.pairing_options();
        Ok(CellCycling::new(pair_sequential(self.records, &options)?)?)
    }
}
