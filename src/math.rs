pub mod integer_linear;
pub mod optimization;

pub use optimization::{
    simplex::{ConstraintSense, LinearProgram, LinearSolution},
    simplex_maximize, simplex_minimize, OptimizationConfig,
};

pub use integer_linear::{
    BranchAndBoundSolver, ILPSolution, ILPSolver, ILPStatus, IntegerLinearProgram,
    ObjectiveSense,
};
