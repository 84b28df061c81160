use crate::error::{Error, Result};
use crate::scheduling::operation::Operation;
use crate::scheduling::pattern::Pattern;

/// How the master problem prices a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostModel {
    /// Every pattern costs one room; the objective counts rooms.
    #[default]
    RoomCount,
    /// A pattern costs the sum of its operations' mean cost across rooms.
    MeanRoomCost,
}

impl CostModel {
    pub fn costs(&self, operations: &[Operation]) -> Result<PatternCosts> {
        match self {
            CostModel::RoomCount => Ok(PatternCosts {
                fixed: 1.0,
                per_operation: vec![0.0; operations.len()],
            }),
            CostModel::MeanRoomCost => {
                let per_operation = operations
                    .iter()
                    .map(|op| {
                        op.mean_room_cost().ok_or_else(|| {
                            Error::invalid_input(format!("operation {} has no room costs", op.id))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(PatternCosts {
                    fixed: 0.0,
                    per_operation,
                })
            }
        }
    }
}

/// Pattern cost split into a fixed part and a per-operation part:
/// `cost(p) = fixed + Σ_{i in p} per_operation[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCosts {
    pub fixed: f64,
    pub per_operation: Vec<f64>,
}

impl PatternCosts {
    pub fn of(&self, pattern: &Pattern) -> f64 {
        self.fixed
            + pattern
                .operations()
                .iter()
                .map(|&i| self.per_operation[i])
                .sum::<f64>()
    }

    /// Pricing weight of operation `i` under dual price `dual`. A pattern
    /// has negative reduced cost iff its weights sum to more than `fixed`.
    pub fn pricing_weight(&self, i: usize, dual: f64) -> f64 {
        dual - self.per_operation[i]
    }
}
