//! # Instrument Format Parsers
//!
//! Turns raw instrument output into normalized [`RawHalfCycle`] records or, for
//! pre-aggregated summaries, a [`RateTable`].
//!
//! ## Supported files
//!
//! | Instrument | Extension | Content |
//! |------------|-----------|---------|
//! | [`Instrument::Gamry`] | `.DTA` | one half-cycle per file |
//! | [`Instrument::Biologic`] | `.mpt` | a whole cycling experiment |
//! | [`Instrument::RateTable`] | `.csv`, `.tsv` | per-cycle rate-test summary |
//!
//! The instrument is resolved from an explicit [`ParseOptions::instrument`]
//! override, then the file extension, then a content sniff. An override must
//! still match the file's content signature.
//!
//! ## Example
//!
//! ```rust,no_run
//! use voltcycle::formats::{parse_file, ParseOptions, ParsedContent};
//!
//! let parsed = parse_file("charge_1.DTA", &ParseOptions::default())?;
//! if let ParsedContent::HalfCycles(records) = parsed.content {
//!     println!("{}: {} samples", records[0].branch(), records[0].len());
//! }
//! # Ok::<(), voltcycle::formats::FormatError>(())
//! ```

pub mod biologic;
mod error;
pub mod gamry;
pub mod numeric;
mod rate_table;
mod record;
pub mod split;


pub use error::FormatError;
pub use rate_table::{RateTable, RateTableRow};
pub use record::{Branch, RawHalfCycle, SourceInfo};
pub use split::{CurrentSignSplitter, HalfCycleSplitter, Segment, SplitRow, TechniqueColumnSplitter};

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

/// Supported instrument families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    /// Gamry `.DTA` single half-cycle files
    Gamry,
    /// Biologic EC-Lab `.mpt` exports
    Biologic,
    /// Delimited per-cycle rate-test summary tables
    RateTable,
}

/// File extension (lowercase) to instrument
const EXTENSION_TABLE: &[(&str, Instrument)] = &[
    ("dta", Instrument::Gamry),
    ("mpt", Instrument::Biologic),
    ("csv", Instrument::RateTable),
    ("tsv", Instrument::RateTable),
];

/// Sniff order; the first matching signature wins
const SNIFF_ORDER: [Instrument; 3] = [Instrument::Gamry, Instrument::Biologic, Instrument::RateTable];

impl Instrument {
    /// Look up the instrument for a file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, instrument)| *instrument)
    }

    /// Check whether `text` carries this instrument's content signature
    pub fn matches_signature(self, text: &str) -> bool {
        match self {
            Self::Gamry => text.lines().any(|l| l.starts_with("CURVE")),
            Self::Biologic => {
                text.starts_with("EC-Lab") || text.lines().any(|l| l.starts_with("mode\t"))
            }
            Self::RateTable => text
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(str::to_lowercase)
                .is_some_and(|h| h.contains("cycle") && h.contains("capacity")),
        }
    }

    /// Identify the instrument from content alone
    pub fn sniff(text: &str) -> Option<Self> {
        SNIFF_ORDER.into_iter().find(|i| i.matches_signature(text))
    }

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gamry => "gamry",
            Self::Biologic => "biologic",
            Self::RateTable => "rate-table",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gamry" | "dta" => Ok(Self::Gamry),
            "biologic" | "mpt" => Ok(Self::Biologic),
            "rate-table" | "rate_table" | "csv" | "tsv" => Ok(Self::RateTable),
            other => Err(format!("unknown instrument '{}'", other)),
        }
    }
}

/// Options controlling a single parse
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// Force a parser instead of resolving it from the extension
    pub instrument: Option<Instrument>,
    /// Custom half-cycle splitting strategy for multi-half-cycle tables
    pub splitter: Option<Arc<dyn HalfCycleSplitter>>,
}

impl ParseOptions {
    /// Force the parser for `instrument`
    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = Some(instrument);
        self
    }

    /// Use a custom half-cycle splitter
    pub fn with_splitter(mut self, splitter: Arc<dyn HalfCycleSplitter>) -> Self {
        self.splitter = Some(splitter);
        self
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("instrument", &self.instrument)
            .field("splitter", &self.splitter.as_ref().map(|s| s.name()))
            .finish()
    }
}

/// What a file contained
#[derive(Debug, Clone)]
pub enum ParsedContent {
    /// Time-series half-cycles in file order
    HalfCycles(Vec<RawHalfCycle>),
    /// Pre-aggregated per-cycle summary
    RateSummary(RateTable),
}

/// Result of parsing one file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// File-level source metadata (timestamp of the first record, if any)
    pub source: SourceInfo,
    /// Parsed content
    pub content: ParsedContent,
}

fn resolve_instrument(file: &Path, text: &str, options: &ParseOptions) -> Result<Instrument, FormatError> {
    if let Some(declared) = options.instrument {
        if !declared.matches_signature(text) {
            return Err(FormatError::malformed(
                file,
                format!("content does not match the declared {} signature", declared),
            ));
        }
        return Ok(declared);
    }
    if let Some(instrument) = Instrument::from_extension(file) {
        return Ok(instrument);
    }
    Instrument::sniff(text)
        .ok_or_else(|| FormatError::unsupported(file, "unknown extension and no recognizable content signature"))
}

/// Parse a file from disk
pub fn parse_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<ParsedFile, FormatError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FormatError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    parse_bytes(path, &bytes, options)
}

/// Parse an in-memory buffer. `name` identifies the buffer in records and errors.
pub fn parse_bytes<P: AsRef<Path>>(name: P, bytes: &[u8], options: &ParseOptions) -> Result<ParsedFile, FormatError> {
    let file = name.as_ref();
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return Err(FormatError::malformed(file, "file is empty"));
    }

    let instrument = resolve_instrument(file, &text, options)?;
    debug!("Parsing {} as {}", file.display(), instrument);

    let mut source = SourceInfo::new(file, instrument);
    let content = match instrument {
        Instrument::Gamry => ParsedContent::HalfCycles(vec![gamry::parse(file, &text)?]),
        Instrument::Biologic => {
            let splitter: &dyn HalfCycleSplitter = match &options.splitter {
                Some(custom) => custom.as_ref(),
                None => &TechniqueColumnSplitter,
            };
            ParsedContent::HalfCycles(biologic::parse_cycling(file, &text, splitter)?)
        }
        Instrument::RateTable => ParsedContent::RateSummary(RateTable::parse(file, &text)?),
    };

    if let ParsedContent::HalfCycles(records) = &content {
        if let Some(first) = records.first() {
            source.timestamp = first.timestamp();
            source.temperature = first.source().temperature;
        }
    }
    Ok(ParsedFile { source, content })
}
