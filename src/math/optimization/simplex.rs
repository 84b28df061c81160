use num_traits::Float;
use std::fmt::Debug;

use crate::error::{Error, Result};
use crate::math::integer_linear::ILPStatus;
use crate::math::optimization::OptimizationConfig;

/// Direction of a linear constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    GreaterEqual,
    Equal,
}

impl ConstraintSense {
    fn flipped(self) -> Self {
        match self {
            ConstraintSense::LessEqual => ConstraintSense::GreaterEqual,
            ConstraintSense::GreaterEqual => ConstraintSense::LessEqual,
            ConstraintSense::Equal => ConstraintSense::Equal,
        }
    }
}

/// A linear programming problem over non-negative variables.
///
/// minimize c^T x
/// subject to A_i x (≤ | ≥ | =) b_i   for every row i
///            x ≥ 0
#[derive(Debug, Clone)]
pub struct LinearProgram<T>
where
    T: Float + Debug,
{
    /// The objective function coefficients (c in min c^T x)
    pub objective: Vec<T>,
    /// The constraint matrix, one dense row per constraint
    pub constraints: Vec<Vec<T>>,
    /// The direction of each constraint row
    pub senses: Vec<ConstraintSense>,
    /// The right-hand side vector
    pub rhs: Vec<T>,
}

impl<T> LinearProgram<T>
where
    T: Float + Debug,
{
    pub fn new(objective: Vec<T>) -> Self {
        Self {
            objective,
            constraints: Vec::new(),
            senses: Vec::new(),
            rhs: Vec::new(),
        }
    }

    pub fn add_constraint(&mut self, row: Vec<T>, sense: ConstraintSense, rhs: T) {
        self.constraints.push(row);
        self.senses.push(sense);
        self.rhs.push(rhs);
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.objective.len();
        if self.senses.len() != self.constraints.len() || self.rhs.len() != self.constraints.len()
        {
            return Err(Error::malformed(format!(
                "{} constraint rows but {} senses and {} right-hand sides",
                self.constraints.len(),
                self.senses.len(),
                self.rhs.len()
            )));
        }
        if let Some(i) = self.constraints.iter().position(|row| row.len() != n) {
            return Err(Error::malformed(format!(
                "constraint row {} has {} coefficients, expected {}",
                i,
                self.constraints[i].len(),
                n
            )));
        }
        let finite = self
            .objective
            .iter()
            .chain(self.rhs.iter())
            .chain(self.constraints.iter().flatten())
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::malformed("non-finite coefficient"));
        }
        Ok(())
    }
}

/// Outcome of a simplex solve.
#[derive(Debug, Clone)]
pub struct LinearSolution<T>
where
    T: Float + Debug,
{
    pub status: ILPStatus,
    /// Values of the original variables; empty unless the status is optimal
    pub optimal_point: Vec<T>,
    pub optimal_value: T,
    /// One dual price per constraint row, the rate of change of the optimal
    /// value per unit increase of that row's right-hand side
    pub duals: Vec<T>,
    /// Number of pivots performed across both phases
    pub iterations: usize,
}

impl<T> LinearSolution<T>
where
    T: Float + Debug,
{
    fn without_point(status: ILPStatus, iterations: usize) -> Self {
        Self {
            status,
            optimal_point: Vec::new(),
            optimal_value: T::zero(),
            duals: Vec::new(),
            iterations,
        }
    }
}

/// Minimizes a linear program using the two-phase Simplex Method.
///
/// Rows with a negative right-hand side are negated up front, slack and
/// surplus columns are added for inequalities, and artificial columns give
/// the starting basis for `≥` and `=` rows. Phase I drives the artificial
/// columns to zero; Phase II optimizes the real objective. The entering
/// column is the most negative reduced cost (Dantzig's rule); after a run
/// of degenerate pivots the solver switches to Bland's rule until the
/// objective moves again, so degenerate problems cannot cycle.
///
/// # Examples
///
/// ```
/// use room_colgen::math::{simplex_minimize, ConstraintSense, LinearProgram, OptimizationConfig};
/// use room_colgen::ILPStatus;
///
/// // minimize x + y subject to x + 2y ≥ 2, x, y ≥ 0
/// let mut lp = LinearProgram::new(vec![1.0_f64, 1.0]);
/// lp.add_constraint(vec![1.0, 2.0], ConstraintSense::GreaterEqual, 2.0);
///
/// let result = simplex_minimize(&lp, &OptimizationConfig::default()).unwrap();
/// assert_eq!(result.status, ILPStatus::Optimal);
/// assert!((result.optimal_value - 1.0).abs() < 1e-9);
/// ```
///
/// # Errors
/// * `MalformedProgram` if row lengths, senses and right-hand sides disagree
pub fn minimize<T>(
    lp: &LinearProgram<T>,
    config: &OptimizationConfig<T>,
) -> Result<LinearSolution<T>>
where
    T: Float + Debug,
{
    lp.validate()?;

    let eps = config.tolerance;
    let n = lp.objective.len();
    let mut tableau = Tableau::build(lp);
    let width = tableau.width();
    let mut iterations = 0;

    // Phase I: find a basic feasible solution
    if tableau.kinds.contains(&Column::Artificial) {
        let phase_one: Vec<T> = tableau
            .kinds
            .iter()
            .map(|&kind| {
                if kind == Column::Artificial {
                    T::one()
                } else {
                    T::zero()
                }
            })
            .collect();
        tableau.set_objective(&phase_one);

        let status = tableau.optimize(config.max_iterations, eps, &mut iterations);
        if status != ILPStatus::Optimal {
            return Ok(LinearSolution::without_point(status, iterations));
        }

        let infeasibility = -tableau.rows[0][width];
        if infeasibility > eps.sqrt() {
            return Ok(LinearSolution::without_point(
                ILPStatus::Infeasible,
                iterations,
            ));
        }
        tableau.drive_out_artificials(eps);
    }

    // Phase II: optimize
    let mut costs = vec![T::zero(); width];
    costs[..n].copy_from_slice(&lp.objective);
    tableau.set_objective(&costs);

    let status = tableau.optimize(config.max_iterations, eps, &mut iterations);
    if status != ILPStatus::Optimal {
        return Ok(LinearSolution::without_point(status, iterations));
    }

    let optimal_point = tableau.primal_values(n, eps);
    let optimal_value = optimal_point
        .iter()
        .zip(lp.objective.iter())
        .fold(T::zero(), |acc, (&x, &c)| acc + c * x);

    Ok(LinearSolution {
        status: ILPStatus::Optimal,
        optimal_point,
        optimal_value,
        duals: tableau.dual_values(),
        iterations,
    })
}

/// Maximizes a linear program by minimizing its negated objective.
pub fn maximize<T>(
    lp: &LinearProgram<T>,
    config: &OptimizationConfig<T>,
) -> Result<LinearSolution<T>>
where
    T: Float + Debug,
{
    let min_lp = LinearProgram {
        objective: lp.objective.iter().map(|&c| -c).collect(),
        constraints: lp.constraints.clone(),
        senses: lp.senses.clone(),
        rhs: lp.rhs.clone(),
    };

    let mut result = minimize(&min_lp, config)?;
    result.optimal_value = -result.optimal_value;
    for dual in result.duals.iter_mut() {
        *dual = -*dual;
    }
    Ok(result)
}

/// Consecutive degenerate pivots tolerated under Dantzig's rule.
const DEGENERATE_PIVOTS_BEFORE_BLAND: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Original,
    Slack,
    Artificial,
}

/// Dense simplex tableau. Row 0 holds reduced costs with `-z` in the
/// right-hand-side column; rows `1..=m` hold the constraints.
struct Tableau<T> {
    rows: Vec<Vec<T>>,
    /// `basis[i]` is the basic column of `rows[i + 1]`
    basis: Vec<usize>,
    kinds: Vec<Column>,
    /// Identity column of each row in the starting basis
    unit_columns: Vec<usize>,
    /// Rows negated during construction to make the right-hand side non-negative
    flipped: Vec<bool>,
}

impl<T> Tableau<T>
where
    T: Float + Debug,
{
    fn build(lp: &LinearProgram<T>) -> Self {
        let m = lp.constraints.len();
        let n = lp.objective.len();

        let flipped: Vec<bool> = lp.rhs.iter().map(|&b| b < T::zero()).collect();
        let senses: Vec<ConstraintSense> = lp
            .senses
            .iter()
            .zip(flipped.iter())
            .map(|(&sense, &flip)| if flip { sense.flipped() } else { sense })
            .collect();

        let slack_count = senses
            .iter()
            .filter(|&&s| s != ConstraintSense::Equal)
            .count();
        let artificial_count = senses
            .iter()
            .filter(|&&s| s != ConstraintSense::LessEqual)
            .count();
        let width = n + slack_count + artificial_count;

        let mut kinds = vec![Column::Original; n];
        kinds.extend(std::iter::repeat(Column::Slack).take(slack_count));
        kinds.extend(std::iter::repeat(Column::Artificial).take(artificial_count));

        let mut rows = vec![vec![T::zero(); width + 1]; m + 1];
        let mut basis = Vec::with_capacity(m);
        let mut next_slack = n;
        let mut next_artificial = n + slack_count;

        for i in 0..m {
            let sign = if flipped[i] { -T::one() } else { T::one() };
            let row = &mut rows[i + 1];
            for (cell, &a) in row.iter_mut().zip(lp.constraints[i].iter()) {
                *cell = sign * a;
            }
            row[width] = sign * lp.rhs[i];

            match senses[i] {
                ConstraintSense::LessEqual => {
                    row[next_slack] = T::one();
                    basis.push(next_slack);
                    next_slack += 1;
                }
                ConstraintSense::GreaterEqual => {
                    row[next_slack] = -T::one();
                    next_slack += 1;
                    row[next_artificial] = T::one();
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                ConstraintSense::Equal => {
                    row[next_artificial] = T::one();
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
        }

        let unit_columns = basis.clone();
        Self {
            rows,
            basis,
            kinds,
            unit_columns,
            flipped,
        }
    }

    fn width(&self) -> usize {
        self.kinds.len()
    }

    /// Installs `costs` as the objective row, priced out against the current basis.
    fn set_objective(&mut self, costs: &[T]) {
        let width = self.width();
        let (objective, constraints) = self.rows.split_at_mut(1);
        let objective = &mut objective[0];
        objective[..width].copy_from_slice(costs);
        objective[width] = T::zero();

        for (row, &basic) in constraints.iter().zip(self.basis.iter()) {
            let coef = objective[basic];
            if coef != T::zero() {
                for (cell, &a) in objective.iter_mut().zip(row.iter()) {
                    *cell = *cell - coef * a;
                }
            }
        }
    }

    /// Pivots until no column prices out negatively. Artificial columns
    /// never re-enter the basis.
    fn optimize(&mut self, max_iterations: usize, eps: T, iterations: &mut usize) -> ILPStatus {
        let width = self.width();
        let mut degenerate_run = 0;
        loop {
            let bland = degenerate_run >= DEGENERATE_PIVOTS_BEFORE_BLAND;
            let Some(entering_col) = self.entering_column(bland, eps) else {
                return ILPStatus::Optimal;
            };

            if *iterations >= max_iterations {
                return ILPStatus::MaxIterationsReached;
            }

            // Minimum ratio test, ties broken by the smallest basic column
            let mut leaving: Option<(usize, T)> = None;
            for (i, row) in self.rows.iter().enumerate().skip(1) {
                let coef = row[entering_col];
                if coef <= eps {
                    continue;
                }
                let ratio = row[width] / coef;
                leaving = match leaving {
                    None => Some((i, ratio)),
                    Some((best, best_ratio)) => {
                        if ratio < best_ratio - eps
                            || (ratio <= best_ratio + eps
                                && self.basis[i - 1] < self.basis[best - 1])
                        {
                            Some((i, ratio))
                        } else {
                            Some((best, best_ratio))
                        }
                    }
                };
            }

            let Some((leaving_row, ratio)) = leaving else {
                return ILPStatus::Unbounded;
            };
            if ratio <= eps {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }

            pivot(&mut self.rows, leaving_row, entering_col, eps);
            self.basis[leaving_row - 1] = entering_col;
            *iterations += 1;
        }
    }

    /// Lowest-index improving column under Bland's rule, otherwise the
    /// most negative reduced cost.
    fn entering_column(&self, bland: bool, eps: T) -> Option<usize> {
        let mut improving = (0..self.width())
            .filter(|&j| self.kinds[j] != Column::Artificial && self.rows[0][j] < -eps);
        if bland {
            return improving.next();
        }
        improving.fold(None, |best: Option<usize>, j| match best {
            Some(b) if self.rows[0][b] <= self.rows[0][j] => Some(b),
            _ => Some(j),
        })
    }

    /// Replaces artificial columns still basic (at zero level) after Phase I
    /// by any non-artificial column with a nonzero entry in their row. Rows
    /// with no such column are redundant and keep their artificial at zero.
    fn drive_out_artificials(&mut self, eps: T) {
        let width = self.width();
        for i in 0..self.basis.len() {
            if self.kinds[self.basis[i]] != Column::Artificial {
                continue;
            }
            let replacement = (0..width).find(|&j| {
                self.kinds[j] != Column::Artificial && self.rows[i + 1][j].abs() > eps
            });
            if let Some(col) = replacement {
                pivot(&mut self.rows, i + 1, col, eps);
                self.basis[i] = col;
            }
        }
    }

    fn primal_values(&self, n: usize, eps: T) -> Vec<T> {
        let width = self.width();
        let mut values = vec![T::zero(); n];
        for (i, &basic) in self.basis.iter().enumerate() {
            if basic < n {
                let value = self.rows[i + 1][width];
                values[basic] = if value.abs() < eps { T::zero() } else { value };
            }
        }
        values
    }

    /// Simplex multipliers `c_B B^-1`, read off the reduced costs of the
    /// starting identity columns (whose Phase II cost is zero).
    fn dual_values(&self) -> Vec<T> {
        self.unit_columns
            .iter()
            .zip(self.flipped.iter())
            .map(|(&col, &flip)| {
                let dual = -self.rows[0][col];
                if flip {
                    -dual
                } else {
                    dual
                }
            })
            .collect()
    }
}

// Perform pivot operation with numerical cleanup
fn pivot<T>(tableau: &mut [Vec<T>], leaving_row: usize, entering_col: usize, eps: T)
where
    T: Float + Debug,
{
    let pivot_scale = T::one() / tableau[leaving_row][entering_col];
    for cell in tableau[leaving_row].iter_mut() {
        *cell = *cell * pivot_scale;
        if cell.abs() < eps {
            *cell = T::zero();
        }
    }

    let pivot_row: Vec<T> = tableau[leaving_row].clone();

    for (i, row) in tableau.iter_mut().enumerate() {
        if i == leaving_row {
            continue;
        }
        let factor = row[entering_col];
        if factor == T::zero() {
            continue;
        }
        for (cell, &p) in row.iter_mut().zip(pivot_row.iter()) {
            *cell = *cell - factor * p;
            if cell.abs() < eps {
                *cell = T::zero();
            }
        }
    }

    // Ensure the pivot column is exactly a unit vector
    for (i, row) in tableau.iter_mut().enumerate() {
        row[entering_col] = if i == leaving_row { T::one() } else { T::zero() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config() -> OptimizationConfig<f64> {
        OptimizationConfig {
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }

    #[test]
    fn test_simple_lp() {
        // minimize -x - y
        // subject to x + y ≤ 1
        let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
        lp.add_constraint(vec![1.0, 1.0], ConstraintSense::LessEqual, 1.0);

        let result = minimize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_value, -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            result.optimal_point[0] + result.optimal_point[1],
            1.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(result.duals[0], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounded_lp() {
        // minimize -2x - y
        // subject to x + y ≤ 2, x ≤ 1
        let mut lp = LinearProgram::new(vec![-2.0, -1.0]);
        lp.add_constraint(vec![1.0, 1.0], ConstraintSense::LessEqual, 2.0);
        lp.add_constraint(vec![1.0, 0.0], ConstraintSense::LessEqual, 1.0);

        let result = minimize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_point[1], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_value, -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.duals[0], -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.duals[1], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_covering_duals_satisfy_strong_duality() {
        // minimize x0 + x1 + x2
        // subject to x0 + x2 ≥ 1, x1 + x2 ≥ 1, x0 + x1 ≥ 1
        let mut lp = LinearProgram::new(vec![1.0, 1.0, 1.0]);
        lp.add_constraint(vec![1.0, 0.0, 1.0], ConstraintSense::GreaterEqual, 1.0);
        lp.add_constraint(vec![0.0, 1.0, 1.0], ConstraintSense::GreaterEqual, 1.0);
        lp.add_constraint(vec![1.0, 1.0, 0.0], ConstraintSense::GreaterEqual, 1.0);

        let result = minimize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_value, 1.5, epsilon = 1e-9);
        let dual_objective: f64 = result.duals.iter().sum();
        assert_abs_diff_eq!(dual_objective, 1.5, epsilon = 1e-9);
        assert!(result.duals.iter().all(|&d| d >= -1e-9));
    }

    #[test]
    fn test_degenerate_lp() {
        // minimize -x - y
        // subject to x + y ≤ 1, x ≤ 0.5, y ≤ 0.5
        let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
        lp.add_constraint(vec![1.0, 1.0], ConstraintSense::LessEqual, 1.0);
        lp.add_constraint(vec![1.0, 0.0], ConstraintSense::LessEqual, 0.5);
        lp.add_constraint(vec![0.0, 1.0], ConstraintSense::LessEqual, 0.5);

        let result = minimize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_point[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_point[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_value, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_beale_cycling_example_terminates() {
        // cycles under Dantzig's rule with lowest-index tie breaking
        let mut lp = LinearProgram::new(vec![-0.75, 20.0, -0.5, 6.0]);
        lp.add_constraint(vec![0.25, -8.0, -1.0, 9.0], ConstraintSense::LessEqual, 0.0);
        lp.add_constraint(vec![0.5, -12.0, -0.5, 3.0], ConstraintSense::LessEqual, 0.0);
        lp.add_constraint(vec![0.0, 0.0, 1.0, 0.0], ConstraintSense::LessEqual, 1.0);

        let result = minimize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_value, -1.25, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_point[2], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_rhs_and_equality() {
        // minimize y subject to x - y ≤ -1
        let mut lp = LinearProgram::new(vec![0.0, 1.0]);
        lp.add_constraint(vec![1.0, -1.0], ConstraintSense::LessEqual, -1.0);
        let result = minimize(&lp, &config()).unwrap();
        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_value, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.duals[0], -1.0, epsilon = 1e-9);

        // minimize x + 2y subject to x + y = 3, x ≤ 1
        let mut lp = LinearProgram::new(vec![1.0, 2.0]);
        lp.add_constraint(vec![1.0, 1.0], ConstraintSense::Equal, 3.0);
        lp.add_constraint(vec![1.0, 0.0], ConstraintSense::LessEqual, 1.0);
        let result = minimize(&lp, &config()).unwrap();
        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_point[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_point[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.optimal_value, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_infeasible_and_unbounded() {
        let mut lp = LinearProgram::new(vec![1.0]);
        lp.add_constraint(vec![1.0], ConstraintSense::LessEqual, 1.0);
        lp.add_constraint(vec![1.0], ConstraintSense::GreaterEqual, 2.0);
        let result = minimize(&lp, &config()).unwrap();
        assert_eq!(result.status, ILPStatus::Infeasible);
        assert!(result.optimal_point.is_empty());

        let mut lp = LinearProgram::new(vec![-1.0]);
        lp.add_constraint(vec![1.0], ConstraintSense::GreaterEqual, 1.0);
        let result = minimize(&lp, &config()).unwrap();
        assert_eq!(result.status, ILPStatus::Unbounded);
    }

    #[test]
    fn test_maximize_flips_value_and_duals() {
        // maximize 3x + 2y subject to x + y ≤ 4, x ≤ 2
        let mut lp = LinearProgram::new(vec![3.0, 2.0]);
        lp.add_constraint(vec![1.0, 1.0], ConstraintSense::LessEqual, 4.0);
        lp.add_constraint(vec![1.0, 0.0], ConstraintSense::LessEqual, 2.0);

        let result = maximize(&lp, &config()).unwrap();

        assert_eq!(result.status, ILPStatus::Optimal);
        assert_abs_diff_eq!(result.optimal_value, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.duals[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.duals[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_malformed_program() {
        let mut lp = LinearProgram::new(vec![1.0, 1.0]);
        lp.add_constraint(vec![1.0], ConstraintSense::LessEqual, 1.0);
        assert!(matches!(
            minimize(&lp, &config()),
            Err(Error::MalformedProgram(_))
        ));
    }
}
