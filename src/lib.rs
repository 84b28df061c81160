pub mod error;
pub mod math;
pub mod scheduling;

pub use error::{Error, Result};
pub use math::{
    BranchAndBoundSolver, ConstraintSense, ILPSolution, ILPSolver, ILPStatus,
    IntegerLinearProgram, ObjectiveSense,
};
pub use scheduling::{
    solve_by_specialty, AssignmentModel, ColumnGenerationConfig, ColumnGenerationOutcome,
    ColumnGenerationSolver, CostModel, IncompatibilityGraph, Operation, Pattern, PatternPool,
    PricingFormulation, Room, RoomSchedule, SchedulingInstance, SweepOrder, Termination,
};
