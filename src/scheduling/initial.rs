use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};
use crate::scheduling::incompatibility::IncompatibilityGraph;
use crate::scheduling::operation::Operation;
use crate::scheduling::pattern::{Pattern, PatternPool};

/// Order in which a first-fit pass visits the operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOrder {
    /// Input order
    Natural,
    /// Input order reversed
    Reverse,
    /// Increasing start time, then end time
    ByStart,
    /// Seeded random permutation
    Shuffled(u64),
}

impl SweepOrder {
    pub fn order(&self, operations: &[Operation]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..operations.len()).collect();
        match *self {
            SweepOrder::Natural => {}
            SweepOrder::Reverse => order.reverse(),
            SweepOrder::ByStart => {
                order.sort_by_key(|&i| (operations[i].start, operations[i].end));
            }
            SweepOrder::Shuffled(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                order.shuffle(&mut rng);
            }
        }
        order
    }
}

/// Greedy first-fit packing: each operation joins the first pattern (in
/// creation order) it does not conflict with, or opens a new one.
pub fn first_fit(order: &[usize], graph: &IncompatibilityGraph) -> Vec<Pattern> {
    let mut bins: Vec<Vec<usize>> = Vec::new();
    for &op in order {
        match bins.iter_mut().find(|bin| graph.compatible_with(op, bin)) {
            Some(bin) => bin.push(op),
            None => bins.push(vec![op]),
        }
    }
    bins.into_iter().map(Pattern::new).collect()
}

/// Runs one first-fit pass per sweep and concatenates the resulting
/// patterns into a pool. Every operation lands in at least one pattern.
///
/// # Errors
/// * `InvalidInput` if `sweeps` is empty while there are operations to cover
pub fn initial_pool(
    operations: &[Operation],
    graph: &IncompatibilityGraph,
    sweeps: &[SweepOrder],
) -> Result<PatternPool> {
    if sweeps.is_empty() && !operations.is_empty() {
        return Err(Error::invalid_input(
            "at least one sweep order is needed to seed the pattern pool",
        ));
    }

    let mut pool = PatternPool::new(operations.len());
    for sweep in sweeps {
        let patterns = first_fit(&sweep.order(operations), graph);
        debug!("{:?} sweep produced {} patterns", sweep, patterns.len());
        for pattern in patterns {
            pool.push(pattern)?;
        }
    }
    Ok(pool)
}
