use log::info;

use crate::error::{Error, Result};
use crate::math::integer_linear::{ILPSolver, IntegerLinearProgram};
use crate::math::optimization::simplex::ConstraintSense;
use crate::scheduling::incompatibility::IncompatibilityGraph;
use crate::scheduling::operation::SchedulingInstance;

/// Compact room-assignment model, one binary per (operation, room):
///
/// minimize   Σ_i Σ_r cost[i][r] x[i][r]
/// subject to Σ_r x[i][r] ≥ 1                  for every operation i
///            x[i][r] + x[j][r] ≤ 1            for every conflict (i, j) and room r
///            x[i][r] ∈ {0, 1}
///
/// Exact, but its size grows with operations × rooms, so it only serves as
/// a baseline on small instances.
pub struct AssignmentModel<'a> {
    instance: &'a SchedulingInstance,
    graph: IncompatibilityGraph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSolution {
    pub objective: f64,
    /// Rooms assigned to each operation, by room index
    pub rooms: Vec<Vec<usize>>,
}

impl AssignmentSolution {
    pub fn rooms_used(&self) -> usize {
        let mut used: Vec<usize> = self.rooms.iter().flatten().copied().collect();
        used.sort_unstable();
        used.dedup();
        used.len()
    }
}

impl<'a> AssignmentModel<'a> {
    /// # Errors
    /// * anything `SchedulingInstance::validate` rejects
    /// * `InvalidInput` if there are no rooms or an operation has no cost row
    pub fn new(instance: &'a SchedulingInstance) -> Result<Self> {
        instance.validate()?;
        if instance.rooms.is_empty() && !instance.is_empty() {
            return Err(Error::invalid_input("assignment model needs at least one room"));
        }
        if let Some(op) = instance.operations.iter().find(|op| op.room_costs.is_empty()) {
            return Err(Error::invalid_input(format!(
                "operation {} has no room costs",
                op.id
            )));
        }
        Ok(Self {
            instance,
            graph: IncompatibilityGraph::build(&instance.operations),
        })
    }

    fn var(&self, operation: usize, room: usize) -> usize {
        operation * self.instance.rooms.len() + room
    }

    pub fn formulate(&self) -> IntegerLinearProgram {
        let rooms = self.instance.rooms.len();
        let objective = self
            .instance
            .operations
            .iter()
            .flat_map(|op| op.room_costs.iter().copied())
            .collect();
        let mut problem = IntegerLinearProgram::minimize(objective);

        for i in 0..self.instance.len() {
            let terms: Vec<(usize, f64)> = (0..rooms).map(|r| (self.var(i, r), 1.0)).collect();
            problem.add_sparse_constraint(&terms, ConstraintSense::GreaterEqual, 1.0);
        }
        for (i, j) in self.graph.edges() {
            for r in 0..rooms {
                problem.add_sparse_constraint(
                    &[(self.var(i, r), 1.0), (self.var(j, r), 1.0)],
                    ConstraintSense::LessEqual,
                    1.0,
                );
            }
        }
        for var in 0..problem.num_vars() {
            problem.set_binary(var);
        }
        problem
    }

    pub fn solve<S>(&self, solver: &S) -> Result<AssignmentSolution>
    where
        S: ILPSolver + ?Sized,
    {
        let solution = solver.solve(&self.formulate())?;
        if !solution.is_optimal() {
            return Err(Error::SolverStatus {
                problem: "room assignment",
                status: solution.status,
            });
        }

        let room_count = self.instance.rooms.len();
        let rooms = (0..self.instance.len())
            .map(|i| {
                (0..room_count)
                    .filter(|&r| solution.values[self.var(i, r)] > 0.5)
                    .collect()
            })
            .collect();
        let assignment = AssignmentSolution {
            objective: solution.objective_value,
            rooms,
        };
        info!(
            "room assignment cost {} using {} rooms",
            assignment.objective,
            assignment.rooms_used()
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::integer_linear::BranchAndBoundSolver;
    use crate::scheduling::operation::{Operation, Room};
    use approx::assert_abs_diff_eq;

    fn instance() -> SchedulingInstance {
        SchedulingInstance::new(vec![
            Operation::new("1", 540, 600).with_room_costs(vec![1.0, 2.0]),
            Operation::new("2", 570, 630).with_room_costs(vec![2.0, 1.0]),
            Operation::new("3", 600, 660).with_room_costs(vec![1.0, 3.0]),
        ])
        .with_rooms(vec![Room::new("Q1"), Room::new("Q2")])
    }

    #[test]
    fn test_cheapest_conflict_free_assignment() {
        let instance = instance();
        let model = AssignmentModel::new(&instance).unwrap();

        let solution = model.solve(&BranchAndBoundSolver::default()).unwrap();

        assert_abs_diff_eq!(solution.objective, 3.0, epsilon = 1e-6);
        assert_eq!(solution.rooms, vec![vec![0], vec![1], vec![0]]);
        assert_eq!(solution.rooms_used(), 2);
    }

    #[test]
    fn test_formulation_size() {
        let instance = instance();
        let problem = AssignmentModel::new(&instance).unwrap().formulate();

        // 3 cover rows, 2 edges x 2 rooms, 6 binary rows
        assert_eq!(problem.num_vars(), 6);
        assert_eq!(problem.constraints.len(), 3 + 4 + 6);
    }

    #[test]
    fn test_single_room_cannot_host_conflicts() {
        let instance = SchedulingInstance::new(vec![
            Operation::new("1", 0, 60).with_room_costs(vec![1.0]),
            Operation::new("2", 30, 90).with_room_costs(vec![1.0]),
        ])
        .with_rooms(vec![Room::new("Q1")]);

        let result = AssignmentModel::new(&instance)
            .unwrap()
            .solve(&BranchAndBoundSolver::default());

        assert!(matches!(result, Err(Error::SolverStatus { .. })));
    }

    #[test]
    fn test_requires_costs() {
        let instance = SchedulingInstance::new(vec![Operation::new("1", 0, 60)])
            .with_rooms(vec![Room::new("Q1")]);
        assert!(AssignmentModel::new(&instance).is_err());
    }
}
