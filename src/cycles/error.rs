use crate::formats::{Branch, FormatError};

/// Errors that can occur while assembling cycles
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// A cycle was given neither a charge nor a discharge
    #[error("Cycle {number} has neither a charge nor a discharge half-cycle")]
    Empty {
        /// Cycle number
        number: usize,
    },

    /// A half-cycle was placed in the slot of the other branch
    #[error("Cycle {number}: expected a {expected} half-cycle, got a {found} one")]
    BranchMismatch {
        /// Cycle number
        number: usize,
        /// Branch of the slot
        expected: Branch,
        /// Branch of the half-cycle given
        found: Branch,
    },

    /// Cycle numbers are not contiguous and ascending
    #[error("Cycle at position {position} is numbered {found}, expected {expected}")]
    NonContiguous {
        /// Position in the sequence
        position: usize,
        /// Number the position requires
        expected: usize,
        /// Number actually found
        found: usize,
    },

    /// Reference index outside the sequence
    #[error("Reference index {index} out of range for {len} cycles")]
    ReferenceOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// Nothing to join
    #[error("Cannot join an empty list of half-cycles")]
    EmptyJoin,

    /// Partial half-cycles of different branches cannot be joined
    #[error("Cannot join {first} and {other} half-cycles")]
    MixedBranches {
        /// Branch of the first part
        first: Branch,
        /// Conflicting branch
        other: Branch,
    },

    /// Joined samples failed record validation
    #[error("Joined record is invalid: {0}")]
    Record(#[from] FormatError),
}
