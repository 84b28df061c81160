use log::info;
use rayon::prelude::*;

use crate::error::Result;
use crate::math::integer_linear::ILPSolver;
use crate::scheduling::column_generation::{ColumnGenerationOutcome, ColumnGenerationSolver};
use crate::scheduling::operation::SchedulingInstance;

/// Solves every specialty of `instance` as an independent run, in parallel.
///
/// Runs share no state; each owns its graph and pattern pool. Results come
/// back in sorted specialty order, one per specialty, so a failed run does
/// not hide the others.
pub fn solve_by_specialty<S>(
    instance: &SchedulingInstance,
    solver: &ColumnGenerationSolver<S>,
) -> Vec<(String, Result<ColumnGenerationOutcome>)>
where
    S: ILPSolver + Sync,
{
    let specialties = instance.specialties();
    info!("solving {} specialties independently", specialties.len());

    specialties
        .into_par_iter()
        .map(|specialty| {
            let partition = instance.filter_specialties(&[specialty.as_str()]);
            let outcome = solver.solve(&partition);
            (specialty, outcome)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::integer_linear::BranchAndBoundSolver;
    use crate::scheduling::column_generation::ColumnGenerationConfig;
    use crate::scheduling::operation::Operation;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_specialties_are_solved_separately() {
        let instance = SchedulingInstance::new(vec![
            Operation::new("c1", 540, 600).with_specialty("Cardiology"),
            Operation::new("u1", 540, 600).with_specialty("Urology"),
            Operation::new("c2", 570, 630).with_specialty("Cardiology"),
            Operation::new("u2", 600, 660).with_specialty("Urology"),
        ]);
        let solver = ColumnGenerationSolver::new(
            BranchAndBoundSolver::default(),
            ColumnGenerationConfig::default(),
        );

        let results = solve_by_specialty(&instance, &solver);

        let names: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["Cardiology", "Urology"]);
        let cardiology = results[0].1.as_ref().unwrap();
        let urology = results[1].1.as_ref().unwrap();
        assert_abs_diff_eq!(cardiology.integer_objective, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(urology.integer_objective, 1.0, epsilon = 1e-6);
    }
}
