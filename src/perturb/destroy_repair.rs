//! Destroy-and-repair perturbation method.

use crate::evaluation::CostEvaluator;
use crate::models::{ProblemData, Solution};
use crate::search::Neighbourhoods;
use crate::{RandomNumberGenerator, SolverError};

use super::{DestroyOperator, DestroyParams, RepairOperator};

/// Perturbs a solution by drawing one destroy and one repair operator
/// uniformly and applying them in sequence.
pub struct DestroyRepair<'a> {
    data: &'a ProblemData,
    neighbours: &'a Neighbourhoods,
    destroy_ops: Vec<DestroyOperator>,
    repair_ops: Vec<RepairOperator>,
    params: DestroyParams,
}

impl<'a> DestroyRepair<'a> {
    /// Creates the perturbation method.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] when either operator list
    /// is empty or the destroy parameters are out of range.
    pub fn new(
        data: &'a ProblemData,
        neighbours: &'a Neighbourhoods,
        destroy_ops: Vec<DestroyOperator>,
        repair_ops: Vec<RepairOperator>,
        params: DestroyParams,
    ) -> Result<Self, SolverError> {
        params.validate()?;

        if destroy_ops.is_empty() || repair_ops.is_empty() {
            return Err(SolverError::InvalidParameter(
                "need at least one destroy and one repair operator".into(),
            ));
        }

        Ok(Self {
            data,
            neighbours,
            destroy_ops,
            repair_ops,
            params,
        })
    }

    /// Applies one destroy and one repair operator to the solution.
    pub fn perturb(
        &self,
        solution: &Solution,
        cost_evaluator: &CostEvaluator,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Solution, SolverError> {
        let destroy = self.destroy_ops[rng.randint(self.destroy_ops.len())];
        let repair = self.repair_ops[rng.randint(self.repair_ops.len())];

        let destroyed = destroy.destroy(self.data, solution, self.neighbours, &self.params, rng)?;
        repair.repair(self.data, &destroyed, cost_evaluator, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Matrix;
    use crate::models::{Client, Depot, Route, VehicleType};
    use crate::search::{compute_neighbours, NeighbourhoodParams};

    fn line_data(n_clients: usize) -> ProblemData {
        let coords: Vec<(i64, i64)> = (0..=n_clients as i64).map(|i| (i, 0)).collect();
        ProblemData::new(
            vec![Depot::new(0, 0)],
            (1..=n_clients as i64)
                .map(|i| Client::new(i, 0).with_delivery(1))
                .collect(),
            vec![Matrix::from_coords(&coords)],
            vec![Matrix::from_coords(&coords)],
            vec![VehicleType::new(4, 5)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_perturb_preserves_all_clients() {
        let data = line_data(12);
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();
        let eval = CostEvaluator::new(20.0, 6.0, 6.0, 6.0);

        let routes = vec![
            Route::new(&data, (1..=5).collect(), 0).unwrap(),
            Route::new(&data, (6..=10).collect(), 0).unwrap(),
            Route::new(&data, vec![11, 12], 0).unwrap(),
        ];
        let solution = Solution::new(&data, routes).unwrap();

        let dr = DestroyRepair::new(
            &data,
            &neighbours,
            DestroyOperator::all(),
            RepairOperator::all(),
            DestroyParams::default(),
        )
        .unwrap();

        let mut rng = RandomNumberGenerator::new(17);
        for _ in 0..20 {
            let perturbed = dr.perturb(&solution, &eval, &mut rng).unwrap();
            // With four vehicles of capacity 5 every client fits again.
            assert_eq!(
                perturbed.num_clients() + perturbed.unassigned().len(),
                data.num_clients()
            );
        }
    }

    #[test]
    fn test_rejects_empty_operator_lists() {
        let data = line_data(3);
        let neighbours = compute_neighbours(&data, &NeighbourhoodParams::default()).unwrap();

        assert!(DestroyRepair::new(
            &data,
            &neighbours,
            vec![],
            RepairOperator::all(),
            DestroyParams::default(),
        )
        .is_err());
    }
}
