use std::path::PathBuf;

/// Errors that can occur while parsing instrument files
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// I/O error reading a source file
    #[error("Failed to read {file}: {source}")]
    Io {
        /// File being read
        file: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Structural or field violation inside a source file
    #[error("Malformed file {file}: {reason}")]
    MalformedFile {
        /// File being parsed
        file: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The instrument kind could not be determined, or no parser handles it
    #[error("Unsupported instrument for {file}: {reason}")]
    UnsupportedInstrument {
        /// File being parsed
        file: PathBuf,
        /// Why no parser matched
        reason: String,
    },

    /// CSV/TSV parsing error in a delimited summary table
    #[error("CSV parsing error in {file}: {source}")]
    Csv {
        /// File being parsed
        file: PathBuf,
        /// Underlying CSV error
        #[source]
        source: csv::Error,
    },
}

impl FormatError {
    pub(crate) fn malformed(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedFile {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UnsupportedInstrument {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// The file this error refers to
    pub fn file(&self) -> &std::path::Path {
        match self {
            Self::Io { file, .. }
            | Self::MalformedFile { file, .. }
            | Self::UnsupportedInstrument { file, .. }
            | Self::Csv { file, .. } => file,
        }
    }
}
