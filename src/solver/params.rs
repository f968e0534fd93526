//! Solver parameters and TOML configuration loading.

use std::path::Path;

use serde::Deserialize;

use crate::evaluation::PenaltyParams;
use crate::perturb::{DestroyOperator, DestroyParams, RepairOperator};
use crate::population::PopulationParams;
use crate::search::{NeighbourhoodParams, NodeOperator, RouteOperator};
use crate::SolverError;

/// Which top-level strategy drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// Single-trajectory iterated local search.
    IteratedLocalSearch,
    /// Population-based genetic search with SREX crossover.
    Genetic,
}

/// Parameters of the iterated local search driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IlsParams {
    /// Probability of running a boosted repair pass on an infeasible
    /// candidate.
    pub repair_probability: f64,
    /// Record-to-record threshold fraction at the start of the run.
    pub accept_start_pct: f64,
    /// Record-to-record threshold fraction at the end of the run.
    pub accept_end_pct: f64,
    /// Upper bound on clients removed per perturbation.
    pub destroy_strength: usize,
    /// Upper bound on one removed string's length.
    pub max_string_size: usize,
}

impl Default for IlsParams {
    fn default() -> Self {
        Self {
            repair_probability: 0.80,
            accept_start_pct: 0.015,
            accept_end_pct: 0.0,
            destroy_strength: 30,
            max_string_size: 10,
        }
    }
}

impl IlsParams {
    /// Destroy parameters carried by this section.
    pub fn destroy_params(&self) -> DestroyParams {
        DestroyParams {
            destroy_strength: self.destroy_strength,
            max_string_size: self.max_string_size,
        }
    }
}

/// Parameters of the genetic driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneticParams {
    /// Probability of running a boosted repair pass on an infeasible
    /// offspring.
    pub repair_probability: f64,
    /// Number of random initial solutions seeding the population.
    pub num_initial_solutions: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            repair_probability: 0.80,
            num_initial_solutions: 25,
        }
    }
}

/// All solver parameters: driver choice, per-component parameter sections,
/// and the operator registries resolved from configuration names.
#[derive(Debug, Clone)]
pub struct SolveParams {
    /// Top-level strategy.
    pub driver: Driver,
    /// Iterated local search section.
    pub ils: IlsParams,
    /// Genetic section.
    pub genetic: GeneticParams,
    /// Penalty management section.
    pub penalty: PenaltyParams,
    /// Granular neighbourhood section.
    pub neighbourhood: NeighbourhoodParams,
    /// Population section.
    pub population: PopulationParams,
    /// Destroy operators, in application order.
    pub destroy_ops: Vec<DestroyOperator>,
    /// Repair operators, in application order.
    pub repair_ops: Vec<RepairOperator>,
    /// Node operators, in registration order.
    pub node_ops: Vec<NodeOperator>,
    /// Route operators, in registration order.
    pub route_ops: Vec<RouteOperator>,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            driver: Driver::IteratedLocalSearch,
            ils: IlsParams::default(),
            genetic: GeneticParams::default(),
            penalty: PenaltyParams::default(),
            neighbourhood: NeighbourhoodParams::default(),
            population: PopulationParams::default(),
            destroy_ops: DestroyOperator::all(),
            repair_ops: RepairOperator::all(),
            node_ops: NodeOperator::all(),
            route_ops: RouteOperator::all(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    driver: Option<String>,
    ils: Option<IlsParams>,
    genetic: Option<GeneticParams>,
    penalty: Option<PenaltyParams>,
    neighbourhood: Option<NeighbourhoodParams>,
    population: Option<PopulationParams>,
    destroy_ops: Option<Vec<String>>,
    repair_ops: Option<Vec<String>>,
    node_ops: Option<Vec<String>>,
    route_ops: Option<Vec<String>>,
}

impl SolveParams {
    /// Loads parameters from a TOML document.
    ///
    /// Recognised sections are `[ils]`, `[genetic]`, `[penalty]`,
    /// `[neighbourhood]`, and `[population]`, plus top-level `driver` and
    /// the operator lists `destroy_ops`, `repair_ops`, `node_ops`, and
    /// `route_ops`. Unknown keys and unknown operator names reject.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Config`] for malformed TOML or unknown
    /// keys, [`SolverError::UnknownOperator`] for unknown operator names,
    /// and [`SolverError::InvalidParameter`] for out-of-domain values.
    pub fn from_toml_str(document: &str) -> Result<Self, SolverError> {
        let raw: RawConfig = toml::from_str(document)?;

        let driver = match raw.driver.as_deref() {
            None | Some("ils") => Driver::IteratedLocalSearch,
            Some("genetic") => Driver::Genetic,
            Some(other) => {
                return Err(SolverError::InvalidParameter(format!(
                    "driver must be 'ils' or 'genetic', got '{other}'"
                )))
            }
        };

        let params = Self {
            driver,
            ils: raw.ils.unwrap_or_default(),
            genetic: raw.genetic.unwrap_or_default(),
            penalty: raw.penalty.unwrap_or_default(),
            neighbourhood: raw.neighbourhood.unwrap_or_default(),
            population: raw.population.unwrap_or_default(),
            destroy_ops: resolve_ops(raw.destroy_ops, DestroyOperator::all, DestroyOperator::from_name)?,
            repair_ops: resolve_ops(raw.repair_ops, RepairOperator::all, RepairOperator::from_name)?,
            node_ops: resolve_ops(raw.node_ops, NodeOperator::all, NodeOperator::from_name)?,
            route_ops: resolve_ops(raw.route_ops, RouteOperator::all, RouteOperator::from_name)?,
        };

        params.validate()?;
        Ok(params)
    }

    /// Loads parameters from a TOML file.
    ///
    /// # Errors
    ///
    /// As [`SolveParams::from_toml_str`], plus [`SolverError::Io`] when
    /// the file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_toml_str(&document)
    }

    /// Validates all parameter domains.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidParameter`] for any out-of-domain
    /// value.
    pub fn validate(&self) -> Result<(), SolverError> {
        for probability in [
            self.ils.repair_probability,
            self.genetic.repair_probability,
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(SolverError::InvalidParameter(
                    "repair_probability must be in [0, 1]".into(),
                ));
            }
        }

        if self.ils.accept_start_pct < 0.0 || self.ils.accept_end_pct > self.ils.accept_start_pct {
            return Err(SolverError::InvalidParameter(
                "need 0 <= accept_end_pct <= accept_start_pct".into(),
            ));
        }

        if self.destroy_ops.is_empty()
            || self.repair_ops.is_empty()
            || self.node_ops.is_empty()
        {
            return Err(SolverError::InvalidParameter(
                "operator lists must not be empty".into(),
            ));
        }

        self.ils.destroy_params().validate()
    }
}

/// Resolves an optional list of operator names against a registry,
/// falling back to the full registry when no list was configured.
fn resolve_ops<T>(
    names: Option<Vec<String>>,
    all: impl FnOnce() -> Vec<T>,
    parse: impl Fn(&str) -> Result<T, SolverError>,
) -> Result<Vec<T>, SolverError> {
    match names {
        None => Ok(all()),
        Some(names) => names.iter().map(|name| parse(name)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_validate() {
        assert!(SolveParams::default().validate().is_ok());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let params = SolveParams::from_toml_str("").unwrap();
        assert_eq!(params.driver, Driver::IteratedLocalSearch);
        assert_eq!(params.node_ops, NodeOperator::all());
        assert_eq!(params.ils.repair_probability, 0.80);
    }

    #[test]
    fn test_sections_override_defaults() {
        let doc = r#"
            driver = "genetic"

            [ils]
            repair_probability = 0.5
            destroy_strength = 12

            [penalty]
            init_load_penalty = 50.0

            [neighbourhood]
            nb_granular = 10

            [population]
            min_pop_size = 5
        "#;
        let params = SolveParams::from_toml_str(doc).unwrap();
        assert_eq!(params.driver, Driver::Genetic);
        assert_eq!(params.ils.repair_probability, 0.5);
        assert_eq!(params.ils.destroy_strength, 12);
        assert_eq!(params.penalty.init_load_penalty, 50.0);
        assert_eq!(params.neighbourhood.nb_granular, 10);
        assert_eq!(params.population.min_pop_size, 5);
    }

    #[test]
    fn test_operator_lists_resolve() {
        let doc = r#"
            destroy_ops = ["random", "string"]
            repair_ops = ["greedy"]
            node_ops = ["relocate", "two_opt"]
            route_ops = []
        "#;
        let params = SolveParams::from_toml_str(doc).unwrap();
        assert_eq!(params.destroy_ops.len(), 2);
        assert_eq!(params.repair_ops, vec![RepairOperator::Greedy]);
        assert_eq!(params.node_ops.len(), 2);
        assert!(params.route_ops.is_empty());
    }

    #[test]
    fn test_unknown_operator_rejects() {
        let doc = r#"node_ops = ["relocate", "three_opt_star"]"#;
        assert!(matches!(
            SolveParams::from_toml_str(doc),
            Err(SolverError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejects() {
        let doc = r#"
            [ils]
            repair_chance = 0.5
        "#;
        assert!(matches!(
            SolveParams::from_toml_str(doc),
            Err(SolverError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_driver_rejects() {
        assert!(SolveParams::from_toml_str(r#"driver = "tabu""#).is_err());
    }

    #[test]
    fn test_out_of_domain_probability_rejects() {
        let doc = r#"
            [ils]
            repair_probability = 1.5
        "#;
        assert!(matches!(
            SolveParams::from_toml_str(doc),
            Err(SolverError::InvalidParameter(_))
        ));
    }
}
