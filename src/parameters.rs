use crate::error::SimulationError;
use crate::grid::Wrap;
use serde_derive::{Deserialize, Serialize};

pub type Days = u32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Parameters {
    /// Requested population size. The grid rounds this down to whole rows.
    pub population_size: usize,
    pub starting_cases: usize,
    /// The overall reproduction number. Recorded for reference; the
    /// spreading itself is driven by the R of each spreader grade.
    pub reproduction_rate: f64,
    /// Length of the infectious period, over which a person's R is spread.
    pub infectious_days: Days,
    pub incubation_days: Days,
    pub carrying_days: Days,
    pub ill_days: Days,
    pub asymptomatic_days: Days,
    /// Probability that an incubation ends without symptoms.
    pub asymptomatic_probability: f64,
    pub wrap: Wrap,
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Parameters {
        Parameters {
            population_size: 1024 * 1024,
            starting_cases: 1,
            reproduction_rate: 3.0,
            infectious_days: 10,
            incubation_days: 5,
            // Carrying and ill together make up the default infectious
            // period.
            carrying_days: 2,
            ill_days: 8,
            asymptomatic_days: 10,
            // The asymptomatic course exists, but is switched off until
            // there is data for it.
            asymptomatic_probability: 0.,
            wrap: Wrap::Flat,
            seed: 0,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.infectious_days == 0 {
            return Err(SimulationError::config(
                "the infectious period must be at least one day",
            ));
        }
        if self.population_size == 0 {
            return Err(SimulationError::config("the population must not be empty"));
        }
        if self.starting_cases > self.population_size {
            return Err(SimulationError::config(format!(
                "{} starting cases do not fit into a population of {}",
                self.starting_cases, self.population_size
            )));
        }
        if !(0. ..=1.).contains(&self.asymptomatic_probability) {
            return Err(SimulationError::config(format!(
                "asymptomatic probability {} is not between 0 and 1",
                self.asymptomatic_probability
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Parameters::default().validate().is_ok());
    }

    #[test]
    fn zero_infectious_days_is_rejected() {
        let p = Parameters {
            infectious_days: 0,
            ..Parameters::default()
        };
        match p.validate() {
            Err(SimulationError::InvalidConfiguration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn too_many_starting_cases_are_rejected() {
        let p = Parameters {
            population_size: 10,
            starting_cases: 11,
            ..Parameters::default()
        };
        assert!(p.validate().is_err());
    }
}
