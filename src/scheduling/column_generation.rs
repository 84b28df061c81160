use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::math::integer_linear::ILPSolver;
use crate::scheduling::cost::CostModel;
use crate::scheduling::incompatibility::IncompatibilityGraph;
use crate::scheduling::initial::{initial_pool, SweepOrder};
use crate::scheduling::master::{MasterProblem, VariableDomain};
use crate::scheduling::operation::{Operation, SchedulingInstance};
use crate::scheduling::pattern::{Pattern, PatternPool};
use crate::scheduling::pricing::{PricingFormulation, PricingProblem};
use crate::scheduling::schedule::RoomSchedule;

/// Configuration for a column generation run.
#[derive(Debug, Clone)]
pub struct ColumnGenerationConfig {
    /// Maximum number of master/pricing iterations before finalizing
    pub max_iterations: usize,
    /// Wall-clock budget checked before each iteration
    pub time_limit: Option<Duration>,
    /// Margin a pricing value must clear to count as improving
    pub tolerance: f64,
    pub cost_model: CostModel,
    /// First-fit passes used to seed the pool
    pub sweeps: Vec<SweepOrder>,
    /// Row structure of the pricing program
    pub pricing: PricingFormulation,
}

impl Default for ColumnGenerationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            time_limit: None,
            tolerance: 1e-6,
            cost_model: CostModel::RoomCount,
            sweeps: vec![SweepOrder::Natural, SweepOrder::Reverse],
            pricing: PricingFormulation::default(),
        }
    }
}

/// Why pattern generation stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    /// The pricing optimum did not exceed the pattern cost threshold.
    NoImprovingPattern { pricing_value: f64 },
    /// Pricing proposed a pattern already in the pool, so the master and
    /// pricing disagree beyond the tolerance and the relaxed bound is not
    /// proven.
    DuplicatePattern,
    IterationLimit,
    TimeLimit,
}

impl Termination {
    /// True only when pricing certified that no pattern improves the master.
    pub fn is_natural(&self) -> bool {
        matches!(self, Termination::NoImprovingPattern { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub master_objective: f64,
    pub pricing_value: f64,
    /// Pool size when the master was solved
    pub pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct ColumnGenerationOutcome {
    pub pool: PatternPool,
    /// Objective of the last relaxed master, if any iteration ran
    pub relaxed_objective: Option<f64>,
    /// Objective of the integer master over the final pool
    pub integer_objective: f64,
    /// Integer multiplicity of each pool pattern
    pub multiplicities: Vec<f64>,
    pub termination: Termination,
    pub history: Vec<IterationRecord>,
}

impl ColumnGenerationOutcome {
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Patterns with a positive multiplicity, with their pool index.
    pub fn selected(&self) -> impl Iterator<Item = (usize, &Pattern, usize)> + '_ {
        self.pool
            .iter()
            .zip(self.multiplicities.iter())
            .enumerate()
            .filter(|&(_, (_, &m))| m > 0.5)
            .map(|(k, (pattern, &m))| (k, pattern, m.round() as usize))
    }

    /// Number of room-days the integer solution opens.
    pub fn room_count(&self) -> usize {
        self.selected().map(|(_, _, m)| m).sum()
    }

    pub fn room_schedules(&self, operations: &[Operation]) -> Vec<RoomSchedule> {
        RoomSchedule::from_selection(&self.pool, &self.multiplicities, operations)
    }
}

/// Column generation over day patterns.
///
/// Seeds the pool with first-fit patterns, then alternates the relaxed
/// master and the pricing problem until no pattern has negative reduced
/// cost or a cap is hit, and finally solves the integer master over the
/// pool it built.
pub struct ColumnGenerationSolver<S: ILPSolver> {
    solver: S,
    config: ColumnGenerationConfig,
}

impl<S: ILPSolver> ColumnGenerationSolver<S> {
    pub fn new(solver: S, config: ColumnGenerationConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &ColumnGenerationConfig {
        &self.config
    }

    /// # Errors
    /// * anything `SchedulingInstance::validate` rejects
    /// * `UncoveredOperation`, `SolverStatus` or `ConflictingPattern` from a solve
    pub fn solve(&self, instance: &SchedulingInstance) -> Result<ColumnGenerationOutcome> {
        instance.validate()?;
        let graph = IncompatibilityGraph::build(&instance.operations);
        let pool = initial_pool(&instance.operations, &graph, &self.config.sweeps)?;
        info!(
            "{} operations, {} conflicts, {} initial patterns",
            instance.len(),
            graph.edge_count(),
            pool.len()
        );
        self.generate(instance, &graph, pool)
    }

    /// Resumes generation from an existing pool instead of seeding one.
    pub fn solve_with_pool(
        &self,
        instance: &SchedulingInstance,
        pool: PatternPool,
    ) -> Result<ColumnGenerationOutcome> {
        instance.validate()?;
        if pool.num_operations() != instance.len() {
            return Err(Error::invalid_input(format!(
                "pool indexes {} operations, instance has {}",
                pool.num_operations(),
                instance.len()
            )));
        }
        let graph = IncompatibilityGraph::build(&instance.operations);
        pool.ensure_independent(&graph, &instance.operations)?;
        self.generate(instance, &graph, pool)
    }

    fn generate(
        &self,
        instance: &SchedulingInstance,
        graph: &IncompatibilityGraph,
        mut pool: PatternPool,
    ) -> Result<ColumnGenerationOutcome> {
        let operations = &instance.operations;
        pool.ensure_covers(operations)?;

        let tolerance = self.config.tolerance;
        let costs = self.config.cost_model.costs(operations)?;
        let pricing =
            PricingProblem::new(graph, &costs, tolerance).with_formulation(self.config.pricing);
        let started = Instant::now();

        let mut history = Vec::new();
        let mut relaxed_objective = None;
        let mut termination = Termination::IterationLimit;

        for iteration in 1..=self.config.max_iterations {
            if let Some(limit) = self.config.time_limit {
                if started.elapsed() >= limit {
                    termination = Termination::TimeLimit;
                    break;
                }
            }

            let master = MasterProblem::new(&pool, &costs).solve(
                &self.solver,
                operations,
                VariableDomain::Continuous,
            )?;
            relaxed_objective = Some(master.objective);

            let candidate = pricing.solve(&self.solver, &master.duals, operations)?;
            debug!(
                "iteration {}: master {:.6}, pricing {:.6}, pool {}",
                iteration,
                master.objective,
                candidate.value,
                pool.len()
            );
            history.push(IterationRecord {
                iteration,
                master_objective: master.objective,
                pricing_value: candidate.value,
                pool_size: pool.len(),
            });

            if !candidate.improves(&costs, tolerance) {
                termination = Termination::NoImprovingPattern {
                    pricing_value: candidate.value,
                };
                break;
            }
            if pool.contains_pattern(&candidate.pattern) {
                warn!(
                    "pricing proposed pattern {:?} already in the pool",
                    candidate.pattern.operations()
                );
                termination = Termination::DuplicatePattern;
                break;
            }
            pool.push(candidate.pattern)?;
        }

        if !termination.is_natural() {
            warn!(
                "generation stopped by {:?} after {} iterations",
                termination,
                history.len()
            );
        }

        let integer = MasterProblem::new(&pool, &costs).solve(
            &self.solver,
            operations,
            VariableDomain::Integer,
        )?;
        info!(
            "integer master objective {} over {} patterns ({:?})",
            integer.objective,
            pool.len(),
            termination
        );

        Ok(ColumnGenerationOutcome {
            pool,
            relaxed_objective,
            integer_objective: integer.objective,
            multiplicities: integer.multiplicities,
            termination,
            history,
        })
    }
}
