use std::path::PathBuf;

use super::FileFailure;
use crate::cycles::CycleError;
use crate::formats::FormatError;

/// Errors that can occur during a File Manager session
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// A file failed to parse
    #[error("Failed to parse {path}: {source}")]
    Format {
        /// File that failed
        path: PathBuf,
        /// Parser error
        #[source]
        source: FormatError,
    },

    /// Path is not a folder
    #[error("Not a folder: {0}")]
    InvalidFolder(PathBuf),

    /// Folder tree does not follow the base / step / reserved-subfolder layout
    #[error("Invalid folder tree at {path}: {reason}")]
    InvalidFolderTree {
        /// Offending folder
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },

    /// Strict pairing found a record that breaks charge/discharge alternation
    #[error("Unpaired data at record {position}: {reason}")]
    UnpairedData {
        /// Position of the offending record in session order
        position: usize,
        /// What broke the alternation
        reason: String,
    },

    /// No records were fetched
    #[error("No half-cycle records in the session")]
    EmptySession,

    /// All-or-nothing conversion of a batch with failures
    #[error("{failed} of {total} files failed to parse")]
    BatchFailed {
        /// Number of failed files
        failed: usize,
        /// Number of files attempted
        total: usize,
        /// The individual failures
        failures: Vec<FileFailure>,
    },

    /// Cycle assembly error
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// I/O error while listing folders
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being listed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
