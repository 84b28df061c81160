use log::{debug, trace};

use crate::error::Result;
use crate::math::integer_linear::{
    ILPSolution, ILPSolver, ILPStatus, IntegerLinearProgram, ObjectiveSense,
};
use crate::math::optimization::simplex::{minimize, ConstraintSense, LinearSolution};
use crate::math::optimization::OptimizationConfig;

/// A bound added to a node's relaxation: `x[var] (sense) value`.
type Branch = (usize, ConstraintSense, f64);

/// Depth-first branch and bound over simplex relaxations.
///
/// Continuous programs are answered by a single simplex solve and carry
/// dual prices; programs with integer variables branch on the most
/// fractional variable and return no duals.
pub struct BranchAndBoundSolver {
    max_nodes: usize,
    tolerance: f64,
    lp_config: OptimizationConfig<f64>,
}

impl BranchAndBoundSolver {
    pub fn new(max_nodes: usize, tolerance: f64) -> Self {
        Self {
            max_nodes,
            tolerance,
            lp_config: OptimizationConfig::default(),
        }
    }

    pub fn with_lp_config(mut self, lp_config: OptimizationConfig<f64>) -> Self {
        self.lp_config = lp_config;
        self
    }

    fn is_integer(&self, value: f64) -> bool {
        (value - value.round()).abs() < self.tolerance
    }

    fn solve_relaxation(
        &self,
        problem: &IntegerLinearProgram,
        branches: &[Branch],
    ) -> Result<LinearSolution<f64>> {
        minimize(&problem.as_linear_program(branches), &self.lp_config)
    }

    fn most_fractional(
        &self,
        problem: &IntegerLinearProgram,
        values: &[f64],
    ) -> Option<(usize, f64)> {
        problem
            .integer_vars
            .iter()
            .map(|&var| (var, values[var]))
            .filter(|&(_, value)| !self.is_integer(value))
            .max_by(|a, b| {
                let fa = 0.5 - (a.1 - a.1.floor() - 0.5).abs();
                let fb = 0.5 - (b.1 - b.1.floor() - 0.5).abs();
                fa.total_cmp(&fb).then(b.0.cmp(&a.0))
            })
    }

    /// The program's initial solution as an incumbent in minimization form,
    /// if it is feasible.
    fn starting_incumbent(
        &self,
        problem: &IntegerLinearProgram,
        sign: f64,
    ) -> Option<(Vec<f64>, f64)> {
        let values = problem.initial_solution.as_ref()?;
        if !problem.is_feasible(values, self.tolerance) {
            debug!("initial solution is infeasible, starting without incumbent");
            return None;
        }
        let mut values = values.clone();
        for &var in &problem.integer_vars {
            values[var] = values[var].round();
        }
        let value = sign * problem.objective_at(&values);
        debug!("starting from incumbent {}", sign * value);
        Some((values, value))
    }

    /// True when every integer solution has an integral objective value, so
    /// relaxation bounds can be rounded up before pruning.
    fn has_integral_objective(&self, problem: &IntegerLinearProgram) -> bool {
        problem.objective.iter().enumerate().all(|(var, &c)| {
            c == 0.0 || (problem.integer_vars.contains(&var) && self.is_integer(c))
        })
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new(100_000, 1e-6)
    }
}

impl ILPSolver for BranchAndBoundSolver {
    fn solve(&self, problem: &IntegerLinearProgram) -> Result<ILPSolution> {
        problem.validate()?;

        // Relaxations are solved in minimization form
        let sign = match problem.sense {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        };

        if problem.is_continuous() {
            let relaxation = self.solve_relaxation(problem, &[])?;
            if relaxation.status != ILPStatus::Optimal {
                return Ok(ILPSolution::without_values(relaxation.status));
            }
            return Ok(ILPSolution {
                values: relaxation.optimal_point,
                objective_value: sign * relaxation.optimal_value,
                status: ILPStatus::Optimal,
                duals: Some(relaxation.duals.iter().map(|&d| sign * d).collect()),
            });
        }

        let integral_objective = self.has_integral_objective(problem);
        let mut incumbent = self.starting_incumbent(problem, sign);
        let mut nodes: Vec<Vec<Branch>> = vec![Vec::new()];
        let mut explored = 0;

        while explored < self.max_nodes {
            let Some(branches) = nodes.pop() else {
                break;
            };
            explored += 1;

            let relaxation = self.solve_relaxation(problem, &branches)?;
            match relaxation.status {
                ILPStatus::Optimal => {}
                ILPStatus::Infeasible => continue,
                status => return Ok(ILPSolution::without_values(status)),
            }

            let bound = if integral_objective {
                (relaxation.optimal_value - self.tolerance).ceil()
            } else {
                relaxation.optimal_value
            };
            if let Some((_, best)) = &incumbent {
                if bound >= best - self.tolerance {
                    trace!("node {} pruned at bound {}", explored, bound);
                    continue;
                }
            }

            match self.most_fractional(problem, &relaxation.optimal_point) {
                None => {
                    let mut values = relaxation.optimal_point;
                    for &var in &problem.integer_vars {
                        values[var] = values[var].round();
                    }
                    let value = values
                        .iter()
                        .zip(problem.objective.iter())
                        .map(|(&x, &c)| sign * c * x)
                        .sum::<f64>();
                    debug!("node {} improves incumbent to {}", explored, sign * value);
                    incumbent = Some((values, value));
                }
                Some((var, value)) => {
                    let mut lower = branches.clone();
                    lower.push((var, ConstraintSense::LessEqual, value.floor()));
                    let mut upper = branches;
                    upper.push((var, ConstraintSense::GreaterEqual, value.ceil()));
                    // Explore the rounded-up branch first
                    nodes.push(lower);
                    nodes.push(upper);
                }
            }
        }

        let exhausted = nodes.is_empty();
        Ok(match incumbent {
            Some((values, value)) => ILPSolution {
                values,
                objective_value: sign * value,
                status: if exhausted {
                    ILPStatus::Optimal
                } else {
                    ILPStatus::MaxIterationsReached
                },
                duals: None,
            },
            None if exhausted => ILPSolution::without_values(ILPStatus::Infeasible),
            None => ILPSolution::without_values(ILPStatus::MaxIterationsReached),
        })
    }
}
