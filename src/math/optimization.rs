pub mod simplex;

use num_traits::Float;
use std::fmt::Debug;

pub use simplex::maximize as simplex_maximize;
pub use simplex::minimize as simplex_minimize;

/// Configuration options for optimization algorithms.
#[derive(Debug, Clone)]
pub struct OptimizationConfig<T>
where
    T: Float + Debug,
{
    /// Maximum number of iterations (simplex pivots across both phases)
    pub max_iterations: usize,
    /// Numerical tolerance for optimality, feasibility and pivot selection
    pub tolerance: T,
}

impl<T> Default for OptimizationConfig<T>
where
    T: Float + Debug,
{
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: T::from(1e-9).unwrap_or_else(T::epsilon),
        }
    }
}
