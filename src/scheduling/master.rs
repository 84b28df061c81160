use crate::error::{Error, Result};
use crate::math::integer_linear::{ILPSolver, IntegerLinearProgram};
use crate::math::optimization::simplex::ConstraintSense;
use crate::scheduling::cost::PatternCosts;
use crate::scheduling::operation::Operation;
use crate::scheduling::pattern::{Pattern, PatternPool};

/// Domain of the pattern multiplicities in the master problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDomain {
    /// Non-negative reals; the solve yields dual prices
    Continuous,
    /// Non-negative integers; used for the final deployable answer
    Integer,
}

impl VariableDomain {
    fn problem_name(self) -> &'static str {
        match self {
            VariableDomain::Continuous => "relaxed master",
            VariableDomain::Integer => "integer master",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterSolution {
    pub objective: f64,
    /// One multiplicity per pattern, in pool order
    pub multiplicities: Vec<f64>,
    /// One dual price per operation covering row; empty in integer mode
    pub duals: Vec<f64>,
}

/// Restricted master problem over a pattern pool:
///
/// minimize   Σ_k cost(p_k) x_k
/// subject to Σ_{k : i ∈ p_k} x_k ≥ 1   for every operation i
///            x_k ≥ 0 (integer in `VariableDomain::Integer`)
///
/// Row `i` of the program is the covering row of operation `i`, so the
/// relaxed solve's duals line up with operation indices.
pub struct MasterProblem<'a> {
    pool: &'a PatternPool,
    costs: &'a PatternCosts,
}

impl<'a> MasterProblem<'a> {
    pub fn new(pool: &'a PatternPool, costs: &'a PatternCosts) -> Self {
        Self { pool, costs }
    }

    pub fn formulate(&self, domain: VariableDomain) -> IntegerLinearProgram {
        let objective = self.pool.iter().map(|p| self.costs.of(p)).collect();
        let mut problem = IntegerLinearProgram::minimize(objective);

        for i in 0..self.pool.num_operations() {
            let terms: Vec<(usize, f64)> =
                self.pool.containing(i).iter().map(|&k| (k, 1.0)).collect();
            problem.add_sparse_constraint(&terms, ConstraintSense::GreaterEqual, 1.0);
        }

        if domain == VariableDomain::Integer {
            for k in 0..self.pool.len() {
                problem.set_integer(k);
            }
            problem.set_initial_solution(self.greedy_cover());
        }
        problem
    }

    /// Opens the pattern covering the most uncovered operations, the cheaper
    /// one on ties, until every operation is covered.
    fn greedy_cover(&self) -> Vec<f64> {
        let patterns: Vec<&Pattern> = self.pool.iter().collect();
        let mut covered = vec![false; self.pool.num_operations()];
        let mut open = vec![0.0; patterns.len()];

        loop {
            let best = patterns
                .iter()
                .enumerate()
                .map(|(k, p)| {
                    let gain = p.operations().iter().filter(|&&i| !covered[i]).count();
                    (k, gain, self.costs.of(p))
                })
                .filter(|&(_, gain, _)| gain > 0)
                .max_by(|a, b| {
                    a.1.cmp(&b.1)
                        .then(b.2.total_cmp(&a.2))
                        .then(b.0.cmp(&a.0))
                });
            let Some((k, _, _)) = best else {
                break;
            };
            open[k] = 1.0;
            for &i in patterns[k].operations() {
                covered[i] = true;
            }
        }
        open
    }

    /// # Errors
    /// * `UncoveredOperation` if an operation is in no pattern
    /// * `SolverStatus` if the solver does not report an optimum
    /// * `MalformedProgram` if a relaxed solve comes back without duals
    pub fn solve<S>(
        &self,
        solver: &S,
        operations: &[Operation],
        domain: VariableDomain,
    ) -> Result<MasterSolution>
    where
        S: ILPSolver + ?Sized,
    {
        self.pool.ensure_covers(operations)?;

        let solution = solver.solve(&self.formulate(domain))?;
        if !solution.is_optimal() {
            return Err(Error::SolverStatus {
                problem: domain.problem_name(),
                status: solution.status,
            });
        }

        let duals = match domain {
            VariableDomain::Continuous => solution
                .duals
                .ok_or_else(|| Error::malformed("relaxed master solve returned no dual prices"))?,
            VariableDomain::Integer => Vec::new(),
        };
        if domain == VariableDomain::Continuous && duals.len() != self.pool.num_operations() {
            return Err(Error::malformed(format!(
                "{} dual prices for {} covering rows",
                duals.len(),
                self.pool.num_operations()
            )));
        }

        Ok(MasterSolution {
            objective: solution.objective_value,
            multiplicities: solution.values,
            duals,
        })
    }
}
