use thiserror::Error;

/// Failure reported by a [`super::MilpSolver`] implementation.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The underlying engine failed to construct or solve the model.
    #[error("solver engine failure: {0}")]
    Engine(String),
    /// The solve exceeded an implementation-defined deadline. Distinct
    /// from proven infeasibility.
    #[error("solve exceeded its deadline")]
    Timeout,
}

/// Per-instance decoding errors. Callers driving a batch can skip or
/// retry the offending predicate instance.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Cost-augmented setup named a gold slot the candidate table does not
    /// contain: the input contract with the scoring collaborator is
    /// broken.
    #[error("gold slot `{slot}` not present in candidate table for frame `{frame}`")]
    GoldSlotMissing { slot: String, frame: String },

    /// The assembled program admits no assignment.
    #[error("no feasible assignment for frame `{frame}`")]
    Infeasible { frame: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Integrity fault: a slot selected other than exactly one candidate.
    /// Cannot occur if the encoder is correct.
    #[error("slot `{slot}` selected {selected} candidates, expected exactly 1")]
    SelectionFault { slot: String, selected: usize },

    /// Integrity fault: the solution vector length does not match the
    /// model's variable count.
    #[error("solver returned {actual} columns, model has {expected}")]
    ColumnCountMismatch { expected: usize, actual: usize },
}
