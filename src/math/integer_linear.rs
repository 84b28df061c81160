pub mod branch_and_bound;


use crate::error::{Error, Result};
use crate::math::optimization::simplex::{ConstraintSense, LinearProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// A linear program over non-negative variables, some of which may be
/// restricted to integer values.
#[derive(Debug, Clone)]
pub struct IntegerLinearProgram {
    pub sense: ObjectiveSense,
    pub objective: Vec<f64>,
    pub constraints: Vec<Vec<f64>>,
    pub senses: Vec<ConstraintSense>,
    pub bounds: Vec<f64>,
    pub integer_vars: Vec<usize>,
    /// Known feasible point a solver may start from
    pub initial_solution: Option<Vec<f64>>,
}

impl IntegerLinearProgram {
    pub fn minimize(objective: Vec<f64>) -> Self {
        Self::new(ObjectiveSense::Minimize, objective)
    }

    pub fn maximize(objective: Vec<f64>) -> Self {
        Self::new(ObjectiveSense::Maximize, objective)
    }

    fn new(sense: ObjectiveSense, objective: Vec<f64>) -> Self {
        Self {
            sense,
            objective,
            constraints: Vec::new(),
            senses: Vec::new(),
            bounds: Vec::new(),
            integer_vars: Vec::new(),
            initial_solution: None,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    /// Appends a constraint row and returns its index.
    pub fn add_constraint(&mut self, row: Vec<f64>, sense: ConstraintSense, bound: f64) -> usize {
        self.constraints.push(row);
        self.senses.push(sense);
        self.bounds.push(bound);
        self.constraints.len() - 1
    }

    /// Appends a sparse constraint `Σ coef * x[var] (sense) bound`.
    pub fn add_sparse_constraint(
        &mut self,
        terms: &[(usize, f64)],
        sense: ConstraintSense,
        bound: f64,
    ) -> usize {
        let mut row = vec![0.0; self.num_vars()];
        for &(var, coef) in terms {
            row[var] += coef;
        }
        self.add_constraint(row, sense, bound)
    }

    pub fn set_integer(&mut self, var: usize) {
        if !self.integer_vars.contains(&var) {
            self.integer_vars.push(var);
        }
    }

    /// Restricts `var` to {0, 1}.
    pub fn set_binary(&mut self, var: usize) {
        self.set_integer(var);
        self.add_sparse_constraint(&[(var, 1.0)], ConstraintSense::LessEqual, 1.0);
    }

    pub fn set_initial_solution(&mut self, values: Vec<f64>) {
        self.initial_solution = Some(values);
    }

    /// True when `values` satisfies every row, non-negativity and
    /// integrality within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.num_vars() || values.iter().any(|&v| v < -tolerance) {
            return false;
        }
        let integral = self
            .integer_vars
            .iter()
            .all(|&var| (values[var] - values[var].round()).abs() <= tolerance);
        integral
            && self
                .constraints
                .iter()
                .zip(self.senses.iter().zip(self.bounds.iter()))
                .all(|(row, (&sense, &bound))| {
                    let lhs: f64 = row.iter().zip(values).map(|(a, x)| a * x).sum();
                    match sense {
                        ConstraintSense::LessEqual => lhs <= bound + tolerance,
                        ConstraintSense::GreaterEqual => lhs >= bound - tolerance,
                        ConstraintSense::Equal => (lhs - bound).abs() <= tolerance,
                    }
                })
    }

    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    pub fn is_continuous(&self) -> bool {
        self.integer_vars.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(&var) = self.integer_vars.iter().find(|&&v| v >= self.num_vars()) {
            return Err(Error::malformed(format!(
                "integer variable {} out of range for {} variables",
                var,
                self.num_vars()
            )));
        }
        self.as_linear_program(&[]).validate()
    }

    /// The continuous relaxation in minimization form, with extra rows appended.
    pub(crate) fn as_linear_program(
        &self,
        extra_rows: &[(usize, ConstraintSense, f64)],
    ) -> LinearProgram<f64> {
        let objective = match self.sense {
            ObjectiveSense::Minimize => self.objective.clone(),
            ObjectiveSense::Maximize => self.objective.iter().map(|&c| -c).collect(),
        };
        let mut lp = LinearProgram {
            objective,
            constraints: self.constraints.clone(),
            senses: self.senses.clone(),
            rhs: self.bounds.clone(),
        };
        for &(var, sense, bound) in extra_rows {
            let mut row = vec![0.0; self.num_vars()];
            row[var] = 1.0;
            lp.add_constraint(row, sense, bound);
        }
        lp
    }
}

#[derive(Debug, Clone)]
pub struct ILPSolution {
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub status: ILPStatus,
    /// One dual price per constraint row, available only when the program
    /// has no integer variables
    pub duals: Option<Vec<f64>>,
}

impl ILPSolution {
    pub(crate) fn without_values(status: ILPStatus) -> Self {
        Self {
            values: vec![],
            objective_value: 0.0,
            status,
            duals: None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == ILPStatus::Optimal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ILPStatus {
    Optimal,
    Infeasible,
    Unbounded,
    MaxIterationsReached,
}

/// A linear / mixed-integer program solver.
///
/// Implementations must return one dual price per constraint row in
/// `ILPSolution::duals` whenever the program is continuous.
pub trait ILPSolver {
    fn solve(&self, problem: &IntegerLinearProgram) -> Result<ILPSolution>;
}

pub use branch_and_bound::BranchAndBoundSolver;
