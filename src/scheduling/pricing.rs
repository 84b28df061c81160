use crate::error::{Error, Result};
use crate::math::integer_linear::{ILPSolver, IntegerLinearProgram};
use crate::math::optimization::simplex::ConstraintSense;
use crate::scheduling::cost::PatternCosts;
use crate::scheduling::incompatibility::IncompatibilityGraph;
use crate::scheduling::operation::Operation;
use crate::scheduling::pattern::Pattern;

/// Best pattern found by one pricing solve.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSolution {
    pub pattern: Pattern,
    /// Sum of the selected operations' pricing weights
    pub value: f64,
}

impl PricingSolution {
    /// True when the pattern has negative reduced cost against the master.
    pub fn improves(&self, costs: &PatternCosts, tolerance: f64) -> bool {
        self.value > costs.fixed + tolerance
    }
}

/// How the independence requirement is written as linear rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingFormulation {
    /// `y_i + y_j ≤ 1` for every conflict edge, plus `y_i ≤ 1` per operation.
    EdgeRows,
    /// `Σ_{i in C} y_i ≤ 1` for every clique `C` of the graph's clique
    /// cover. Each edge row is implied by a clique row, so both admit the
    /// same 0/1 points; on interval conflicts the relaxation is integral.
    #[default]
    CliqueRows,
}

/// Maximum-weight independent set on the incompatibility graph, weights
/// taken from the relaxed master's dual prices:
///
/// maximize   Σ_i w_i y_i
/// subject to at most one y_i of every conflicting pair is 1
///            y_i ∈ {0, 1}
///
/// Operations whose weight is not positive can never raise the objective
/// and are left out of the program. A greedy independent set is handed to
/// the solver as a starting point.
pub struct PricingProblem<'a> {
    graph: &'a IncompatibilityGraph,
    costs: &'a PatternCosts,
    tolerance: f64,
    formulation: PricingFormulation,
}

impl<'a> PricingProblem<'a> {
    pub fn new(graph: &'a IncompatibilityGraph, costs: &'a PatternCosts, tolerance: f64) -> Self {
        Self {
            graph,
            costs,
            tolerance,
            formulation: PricingFormulation::default(),
        }
    }

    pub fn with_formulation(mut self, formulation: PricingFormulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn weights(&self, duals: &[f64]) -> Vec<f64> {
        duals
            .iter()
            .enumerate()
            .map(|(i, &dual)| self.costs.pricing_weight(i, dual))
            .collect()
    }

    /// Builds the program over the positively weighted operations. Returns
    /// it with the operation index behind each variable.
    pub fn formulate(&self, weights: &[f64]) -> (IntegerLinearProgram, Vec<usize>) {
        let candidates: Vec<usize> = (0..weights.len())
            .filter(|&i| weights[i] > self.tolerance)
            .collect();

        let mut var_of = vec![None; weights.len()];
        for (var, &op) in candidates.iter().enumerate() {
            var_of[op] = Some(var);
        }

        let objective = candidates.iter().map(|&i| weights[i]).collect();
        let mut problem = IntegerLinearProgram::maximize(objective);

        match self.formulation {
            PricingFormulation::EdgeRows => {
                for (i, j) in self.graph.edges() {
                    if let (Some(a), Some(b)) = (var_of[i], var_of[j]) {
                        problem.add_sparse_constraint(
                            &[(a, 1.0), (b, 1.0)],
                            ConstraintSense::LessEqual,
                            1.0,
                        );
                    }
                }
                for var in 0..candidates.len() {
                    problem.set_binary(var);
                }
            }
            PricingFormulation::CliqueRows => {
                // every candidate sits in some clique, which bounds it by 1
                for clique in self.graph.cliques_among(|i| var_of[i].is_some()) {
                    let terms: Vec<(usize, f64)> = clique
                        .iter()
                        .filter_map(|&i| var_of[i].map(|var| (var, 1.0)))
                        .collect();
                    problem.add_sparse_constraint(&terms, ConstraintSense::LessEqual, 1.0);
                }
                for var in 0..candidates.len() {
                    problem.set_integer(var);
                }
            }
        }

        problem.set_initial_solution(self.greedy_selection(weights, &candidates));
        (problem, candidates)
    }

    /// Heaviest-first independent set over `candidates`, as 0/1 values in
    /// candidate order.
    fn greedy_selection(&self, weights: &[f64], candidates: &[usize]) -> Vec<f64> {
        let mut by_weight: Vec<usize> = (0..candidates.len()).collect();
        by_weight.sort_by(|&a, &b| {
            weights[candidates[b]]
                .total_cmp(&weights[candidates[a]])
                .then(a.cmp(&b))
        });

        let mut chosen: Vec<usize> = Vec::new();
        let mut values = vec![0.0; candidates.len()];
        for var in by_weight {
            let op = candidates[var];
            if self.graph.compatible_with(op, &chosen) {
                chosen.push(op);
                values[var] = 1.0;
            }
        }
        values
    }

    /// # Errors
    /// * `MalformedProgram` if `duals` does not hold one price per operation
    /// * `SolverStatus` if the solver does not report an optimum
    /// * `ConflictingPattern` if the solver selects two conflicting operations
    pub fn solve<S>(
        &self,
        solver: &S,
        duals: &[f64],
        operations: &[Operation],
    ) -> Result<PricingSolution>
    where
        S: ILPSolver + ?Sized,
    {
        if duals.len() != self.graph.len() {
            return Err(Error::malformed(format!(
                "{} dual prices for {} operations",
                duals.len(),
                self.graph.len()
            )));
        }

        let weights = self.weights(duals);
        let (problem, candidates) = self.formulate(&weights);
        if candidates.is_empty() {
            return Ok(PricingSolution {
                pattern: Pattern::new(Vec::new()),
                value: 0.0,
            });
        }

        let solution = solver.solve(&problem)?;
        if !solution.is_optimal() {
            return Err(Error::SolverStatus {
                problem: "pricing",
                status: solution.status,
            });
        }

        let selected: Vec<usize> = candidates
            .iter()
            .zip(solution.values.iter())
            .filter(|&(_, &y)| y > 0.5)
            .map(|(&op, _)| op)
            .collect();

        let pattern = Pattern::new(selected);
        if let Some((i, j)) = self.graph.find_conflict(pattern.operations()) {
            return Err(Error::ConflictingPattern {
                first: operations[i].id.clone(),
                second: operations[j].id.clone(),
            });
        }

        let value = pattern.operations().iter().map(|&i| weights[i]).sum();
        Ok(PricingSolution { pattern, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::integer_linear::{BranchAndBoundSolver, ILPSolution, ILPStatus};
    use crate::scheduling::cost::CostModel;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scenario_a() -> Vec<Operation> {
        vec![
            Operation::new("1", 540, 600),
            Operation::new("2", 570, 630),
            Operation::new("3", 600, 660),
        ]
    }

    #[test]
    fn test_picks_heaviest_independent_set() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();
        let pricing = PricingProblem::new(&graph, &costs, 1e-9);

        let solution = pricing
            .solve(&BranchAndBoundSolver::default(), &[0.6, 1.0, 0.7], &operations)
            .unwrap();

        assert_eq!(solution.pattern, Pattern::new(vec![0, 2]));
        assert_abs_diff_eq!(solution.value, 1.3, epsilon = 1e-9);
        assert!(solution.improves(&costs, 1e-6));
    }

    #[test]
    fn test_non_positive_duals_give_empty_pattern() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();
        let pricing = PricingProblem::new(&graph, &costs, 1e-9);

        let solution = pricing
            .solve(&BranchAndBoundSolver::default(), &[0.0, -1.0, 0.0], &operations)
            .unwrap();

        assert!(solution.pattern.is_empty());
        assert_eq!(solution.value, 0.0);
        assert!(!solution.improves(&costs, 1e-6));
    }

    #[test]
    fn test_formulation_skips_non_positive_weights() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();
        let pricing = PricingProblem::new(&graph, &costs, 1e-9);

        let (problem, candidates) = pricing.formulate(&[0.5, 0.0, 0.5]);

        assert_eq!(candidates, vec![0, 2]);
        assert_eq!(problem.num_vars(), 2);
        // operations 0 and 2 do not conflict, so each keeps a singleton row
        assert_eq!(problem.constraints.len(), 2);
    }

    #[test]
    fn test_clique_rows_replace_edge_and_bound_rows() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();

        let (cliques, _) = PricingProblem::new(&graph, &costs, 1e-9).formulate(&[1.0, 1.0, 1.0]);
        let (edges, _) = PricingProblem::new(&graph, &costs, 1e-9)
            .with_formulation(PricingFormulation::EdgeRows)
            .formulate(&[1.0, 1.0, 1.0]);

        // {0, 1} and {1, 2} against two edges plus three bounds
        assert_eq!(cliques.constraints.len(), 2);
        assert_eq!(edges.constraints.len(), 5);
        assert_eq!(cliques.initial_solution, Some(vec![1.0, 0.0, 1.0]));
        assert!(cliques.is_feasible(&[1.0, 0.0, 1.0], 1e-9));
        assert!(!cliques.is_feasible(&[1.0, 1.0, 0.0], 1e-9));
    }

    fn random_operations(rng: &mut StdRng, n: usize) -> Vec<Operation> {
        (0..n)
            .map(|i| {
                let start = 480 + 15 * rng.gen_range(0..36);
                Operation::new(format!("op{}", i), start, start + 15 * rng.gen_range(1..10))
            })
            .collect()
    }

    #[test]
    fn test_formulations_agree() {
        let mut rng = StdRng::seed_from_u64(9);
        let solver = BranchAndBoundSolver::default();

        for _ in 0..5 {
            let operations = random_operations(&mut rng, 14);
            let graph = IncompatibilityGraph::build(&operations);
            let costs = CostModel::RoomCount.costs(&operations).unwrap();
            let duals: Vec<f64> = (0..14).map(|_| rng.gen_range(-0.2..1.0)).collect();

            let by_clique = PricingProblem::new(&graph, &costs, 1e-9)
                .solve(&solver, &duals, &operations)
                .unwrap();
            let by_edge = PricingProblem::new(&graph, &costs, 1e-9)
                .with_formulation(PricingFormulation::EdgeRows)
                .solve(&solver, &duals, &operations)
                .unwrap();

            assert_abs_diff_eq!(by_clique.value, by_edge.value, epsilon = 1e-6);
            assert!(graph.is_independent(by_clique.pattern.operations()));
        }
    }

    #[test]
    fn test_full_day_is_solved_at_the_root() {
        let mut rng = StdRng::seed_from_u64(17);
        let operations = random_operations(&mut rng, 120);
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();

        // unit weights: the most operations one room can take
        let mut by_end: Vec<&Operation> = operations.iter().collect();
        by_end.sort_by_key(|op| op.end);
        let mut free_from = 0;
        let mut most = 0;
        for op in by_end {
            if op.start >= free_from {
                most += 1;
                free_from = op.end;
            }
        }

        let solution = PricingProblem::new(&graph, &costs, 1e-9)
            .solve(&BranchAndBoundSolver::new(1, 1e-6), &vec![1.0; 120], &operations)
            .unwrap();

        assert_abs_diff_eq!(solution.value, most as f64, epsilon = 1e-6);
        assert_eq!(solution.pattern.len(), most);
    }

    struct ConflictingSolver;

    impl ILPSolver for ConflictingSolver {
        fn solve(&self, problem: &IntegerLinearProgram) -> Result<ILPSolution> {
            Ok(ILPSolution {
                values: vec![1.0; problem.num_vars()],
                objective_value: problem.objective.iter().sum(),
                status: ILPStatus::Optimal,
                duals: None,
            })
        }
    }

    #[test]
    fn test_conflicting_selection_is_rejected() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();
        let pricing = PricingProblem::new(&graph, &costs, 1e-9);

        let result = pricing.solve(&ConflictingSolver, &[1.0, 1.0, 1.0], &operations);

        assert_eq!(
            result,
            Err(Error::ConflictingPattern {
                first: "1".to_string(),
                second: "2".to_string()
            })
        );
    }

    #[test]
    fn test_wrong_dual_count() {
        let operations = scenario_a();
        let graph = IncompatibilityGraph::build(&operations);
        let costs = CostModel::RoomCount.costs(&operations).unwrap();
        let pricing = PricingProblem::new(&graph, &costs, 1e-9);

        assert!(matches!(
            pricing.solve(&BranchAndBoundSolver::default(), &[1.0], &operations),
            Err(Error::MalformedProgram(_))
        ));
    }
}
