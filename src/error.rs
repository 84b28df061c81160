use thiserror::Error;

use crate::math::integer_linear::ILPStatus;

/// Errors produced while building or solving a room-scheduling instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation {id} ends at {end} before it starts at {start}")]
    InvalidInterval { id: String, start: u32, end: u32 },

    #[error("operation id {0} appears more than once")]
    DuplicateOperation(String),

    /// An operation is not contained in any pattern of the pool, so the
    /// covering master problem has no feasible solution.
    #[error("operation {0} is not covered by any pattern")]
    UncoveredOperation(String),

    #[error("{problem} solve ended with status {status:?}")]
    SolverStatus {
        problem: &'static str,
        status: ILPStatus,
    },

    #[error("pricing selected conflicting operations {first} and {second}")]
    ConflictingPattern { first: String, second: String },

    #[error("malformed program: {0}")]
    MalformedProgram(String),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedProgram(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
