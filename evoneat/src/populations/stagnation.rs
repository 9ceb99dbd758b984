//! Tracking of species' fitness over generations,
//! and removal of species that stop improving.
use super::{ConfigurationError, EvolutionError, PopulationConfig, SpeciesID};

use serde::{Deserialize, Serialize};
use tracing::info;

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Aggregate used to summarize a species'
/// member fitnesses into a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesFitnessFunc {
    Max,
    Min,
    Mean,
    /// The upper-middle element for even-sized species.
    Median,
}

impl SpeciesFitnessFunc {
    /// Aggregates a list of fitnesses. Returns `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use evoneat::SpeciesFitnessFunc;
    ///
    /// let fitnesses = [4.0, 1.0, 3.0, 2.0];
    /// assert_eq!(SpeciesFitnessFunc::Max.apply(&fitnesses), Some(4.0));
    /// assert_eq!(SpeciesFitnessFunc::Min.apply(&fitnesses), Some(1.0));
    /// assert_eq!(SpeciesFitnessFunc::Mean.apply(&fitnesses), Some(2.5));
    /// assert_eq!(SpeciesFitnessFunc::Median.apply(&fitnesses), Some(3.0));
    /// assert_eq!(SpeciesFitnessFunc::Mean.apply(&[]), None);
    /// ```
    pub fn apply(self, fitnesses: &[f32]) -> Option<f32> {
        if fitnesses.is_empty() {
            return None;
        }
        Some(match self {
            Self::Max => fitnesses.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Self::Min => fitnesses.iter().copied().fold(f32::INFINITY, f32::min),
            Self::Mean => fitnesses.iter().sum::<f32>() / fitnesses.len() as f32,
            Self::Median => {
                let mut sorted = fitnesses.to_vec();
                sorted.sort_unstable_by(|a, b| a.total_cmp(b));
                sorted[sorted.len() / 2]
            }
        })
    }
}

impl FromStr for SpeciesFitnessFunc {
    type Err = ConfigurationError;

    /// # Examples
    /// ```
    /// use evoneat::{ConfigurationError, SpeciesFitnessFunc};
    ///
    /// assert_eq!("mean".parse(), Ok(SpeciesFitnessFunc::Mean));
    /// assert_eq!(
    ///     "average".parse::<SpeciesFitnessFunc>(),
    ///     Err(ConfigurationError::UnknownSpeciesFitnessFunc("average".into())),
    /// );
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(ConfigurationError::UnknownSpeciesFitnessFunc(other.to_string())),
        }
    }
}

impl fmt::Display for SpeciesFitnessFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Mean => "mean",
            Self::Median => "median",
        };
        write!(f, "{}", name)
    }
}

/// Per-species stagnation state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagnationRecord {
    /// Species fitness at the previous update.
    pub previous_fitness: f32,
    /// Consecutive updates without a strict improvement.
    pub stagnant_count: usize,
}

impl Default for StagnationRecord {
    fn default() -> Self {
        StagnationRecord {
            previous_fitness: f32::NEG_INFINITY,
            stagnant_count: 0,
        }
    }
}

/// Outcome of a stagnation update for a single species.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeciesVerdict {
    pub species: SpeciesID,
    /// The species' aggregated fitness this generation.
    pub fitness: f32,
    /// Whether the species must be removed.
    pub stagnant: bool,
    /// Whether the species' fitness is among the top
    /// `species_elitism` distinct values, regardless of
    /// whether that protection was needed or granted.
    pub elite: bool,
}

/// Stagnation tracker. Keeps one [`StagnationRecord`]
/// per living species, created the first time the
/// species is seen and dropped when it is removed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stagnation {
    max_stagnation: NonZeroUsize,
    species_fitness_func: SpeciesFitnessFunc,
    species_elitism: usize,
    records: BTreeMap<SpeciesID, StagnationRecord>,
}

impl Stagnation {
    /// Creates a tracker with no records.
    pub fn new(
        max_stagnation: NonZeroUsize,
        species_fitness_func: SpeciesFitnessFunc,
        species_elitism: usize,
    ) -> Stagnation {
        Stagnation {
            max_stagnation,
            species_fitness_func,
            species_elitism,
            records: BTreeMap::new(),
        }
    }

    /// Creates a tracker using the stagnation
    /// parameters of a population configuration.
    pub fn from_config(config: &PopulationConfig) -> Stagnation {
        Stagnation::new(
            config.max_stagnation,
            config.species_fitness_func,
            config.species_elitism,
        )
    }

    /// Updates every species' record with its members'
    /// current fitnesses, and decides which species
    /// are stagnant.
    ///
    /// A species is stagnant once it has gone
    /// `max_stagnation` updates without strictly improving
    /// on its previous fitness. Species whose fitness is
    /// among the top `species_elitism` distinct values are
    /// spared, walking `species` in order, until
    /// `species_elitism` species have been spared. The
    /// records of species left stagnant are dropped.
    ///
    /// # Errors
    /// Fails without modifying any record
    /// if a species has no member fitnesses.
    ///
    /// # Examples
    /// ```
    /// use evoneat::{SpeciesFitnessFunc, SpeciesID, Stagnation};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut stagnation = Stagnation::new(
    ///     NonZeroUsize::new(3).unwrap(),
    ///     SpeciesFitnessFunc::Max,
    ///     0,
    /// );
    /// let species = [(SpeciesID(0, 0), vec![10.0, 4.0])];
    /// for _ in 0..3 {
    ///     assert!(!stagnation.update(&species).unwrap()[0].stagnant);
    /// }
    /// assert!(stagnation.update(&species).unwrap()[0].stagnant);
    /// ```
    pub fn update(
        &mut self,
        species: &[(SpeciesID, Vec<f32>)],
    ) -> Result<Vec<SpeciesVerdict>, EvolutionError> {
        let fitnesses = species
            .iter()
            .map(|(id, members)| {
                self.species_fitness_func.apply(members).ok_or_else(|| {
                    EvolutionError::InvariantViolation(format!(
                        "species {:?} has no members to measure stagnation on",
                        id
                    ))
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let mut verdicts: Vec<SpeciesVerdict> = species
            .iter()
            .zip(fitnesses)
            .map(|((id, _), fitness)| {
                let record = self.records.entry(*id).or_default();
                if fitness > record.previous_fitness {
                    record.stagnant_count = 0;
                } else {
                    record.stagnant_count += 1;
                }
                record.previous_fitness = fitness;
                SpeciesVerdict {
                    species: *id,
                    fitness,
                    stagnant: record.stagnant_count >= self.max_stagnation.get(),
                    elite: false,
                }
            })
            .collect();

        let elite_fitnesses = self.elite_fitnesses(&verdicts);
        let mut spared = 0;
        for verdict in &mut verdicts {
            verdict.elite = elite_fitnesses.contains(&verdict.fitness);
            if verdict.stagnant && verdict.elite && spared < self.species_elitism {
                verdict.stagnant = false;
                spared += 1;
            }
        }

        for verdict in verdicts.iter().filter(|v| v.stagnant) {
            self.records.remove(&verdict.species);
        }

        info!(
            stagnant_counts = ?self
                .records
                .iter()
                .map(|(id, r)| (*id, r.stagnant_count))
                .collect::<Vec<_>>(),
            "species stagnation updated"
        );

        Ok(verdicts)
    }

    /// Returns the top `species_elitism` distinct fitness values.
    fn elite_fitnesses(&self, verdicts: &[SpeciesVerdict]) -> Vec<f32> {
        let mut fitnesses: Vec<f32> = verdicts.iter().map(|v| v.fitness).collect();
        fitnesses.sort_unstable_by(|a, b| b.total_cmp(a));
        fitnesses.dedup();
        fitnesses.truncate(self.species_elitism);
        fitnesses
    }

    /// Drops a species' record.
    pub fn remove(&mut self, species: SpeciesID) -> Option<StagnationRecord> {
        self.records.remove(&species)
    }

    /// Returns the number of consecutive non-improving
    /// updates of a species, if it is being tracked.
    pub fn stagnant_count(&self, species: SpeciesID) -> Option<usize> {
        self.records.get(&species).map(|r| r.stagnant_count)
    }

    /// Iterates over all records, in ascending species ID order.
    pub fn records(&self) -> impl Iterator<Item = (&SpeciesID, &StagnationRecord)> {
        self.records.iter()
    }

    pub fn max_stagnation(&self) -> NonZeroUsize {
        self.max_stagnation
    }

    pub fn species_fitness_func(&self) -> SpeciesFitnessFunc {
        self.species_fitness_func
    }

    pub fn species_elitism(&self) -> usize {
        self.species_elitism
    }
}
