pub mod assignment;
pub mod batch;
pub mod column_generation;
pub mod cost;
pub mod incompatibility;
pub mod initial;
pub mod master;
pub mod operation;
pub mod pattern;
pub mod pricing;
pub mod schedule;


pub use assignment::{AssignmentModel, AssignmentSolution};
pub use batch::solve_by_specialty;
pub use column_generation::{
    ColumnGenerationConfig, ColumnGenerationOutcome, ColumnGenerationSolver, IterationRecord,
    Termination,
};
pub use cost::{CostModel, PatternCosts};
pub use incompatibility::IncompatibilityGraph;
pub use initial::{first_fit, initial_pool, SweepOrder};
pub use master::{MasterProblem, MasterSolution, VariableDomain};
pub use operation::{parse_clock, Operation, Room, SchedulingInstance};
pub use pattern::{Pattern, PatternPool};
pub use pricing::{PricingFormulation, PricingProblem, PricingSolution};
pub use schedule::RoomSchedule;
