use crate::cycles::CycleError;
use crate::formats::FormatError;
use crate::manager::ManagerError;

/// Errors that can occur while building or querying a [`RateExperiment`](super::RateExperiment)
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    /// Current list and cycling list differ in length
    #[error("Mismatched steps: {currents} currents for {steps} cycling experiments")]
    MismatchedSteps {
        /// Number of currents given
        currents: usize,
        /// Number of cycling experiments given
        steps: usize,
    },

    /// Retention reference outside the experiment
    #[error("Reference (step {step}, point {point}) is out of range")]
    ReferenceOutOfRange {
        /// Step index
        step: usize,
        /// Point index inside the step
        point: usize,
    },

    /// Source file error
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Ingestion error from a per-step session
    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),

    /// Cycle assembly error
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),
}
