//! Reporting of a population's progress.
//!
//! A population pushes [`ReportEvent`]s to every registered
//! [`Reporter`] as it moves through a generation. Snapshots of
//! the population itself can be taken with an [`EvolutionLogger`].
use super::{Population, SpeciesID};
use crate::{Genome, GenomeId, InnovationHistory};

use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Why a species stopped existing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// The species went too long without improving.
    Stagnated,
    /// No genome was compatible with the species' representative.
    Empty,
    /// The species was allotted no offspring.
    NoOffspring,
}

/// Notable occurrences during evolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReportEvent {
    GenerationStarted {
        generation: usize,
    },
    /// A genome was given the floor fitness.
    EvaluationFailed {
        generation: usize,
        genome: GenomeId,
        error: String,
    },
    GenerationEvaluated {
        generation: usize,
        best_fitness: f32,
        mean_fitness: f32,
    },
    SpeciesCreated {
        generation: usize,
        species: SpeciesID,
    },
    SpeciesRemoved {
        generation: usize,
        species: SpeciesID,
        reason: RemovalReason,
    },
    /// Consecutive non-improving generations of every tracked species.
    StagnationCounts {
        generation: usize,
        counts: Vec<(SpeciesID, usize)>,
    },
    GenerationCompleted {
        generation: usize,
        species_count: usize,
        population_size: usize,
    },
}

/// A sink for [`ReportEvent`]s.
///
/// Delivery failures are logged and otherwise ignored;
/// they never interrupt evolution.
pub trait Reporter: Send {
    fn report(&mut self, event: &ReportEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// An in-memory reporter. Clones share the same log,
/// so a clone kept by the caller sees every event
/// delivered to the one handed to a population.
///
/// # Examples
/// ```
/// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
/// use evoneat::{Population, PopulationConfig};
/// use evoneat::logging::{EventLog, ReportEvent};
///
/// # let genetic_config = GeneticConfig::zero();
/// let log = EventLog::new();
/// // With `G` a suitable type implementing `Genome`...
/// let mut population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config).unwrap();
/// population.add_reporter(log.clone());
///
/// population.evaluate_fitness(&mut |_: &G| 1.0);
/// assert_eq!(log.events()[0], ReportEvent::GenerationStarted { generation: 0 });
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl EventLog {
    pub fn new() -> EventLog {
        EventLog::default()
    }

    /// Returns a copy of every event received so far.
    pub fn events(&self) -> Vec<ReportEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for EventLog {
    fn report(&mut self, event: &ReportEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.events
            .lock()
            .map_err(|_| "event log poisoned by a panicking reader")?
            .push(event.clone());
        Ok(())
    }
}

/// How many genomes a snapshot copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Every genome, grouped by species.
    AllGenomes,
    /// The champion of each species.
    SpeciesChampions,
    /// The population champion only.
    PopulationChampion,
    /// No genomes.
    NoGenomes,
}

/// The genomes copied into a snapshot.
#[derive(Clone, Debug)]
pub enum Sample<G> {
    /// Species IDs, members and stagnation counts.
    Species(Vec<(SpeciesID, Vec<G>, usize)>),
    /// Species IDs, champions and stagnation counts.
    SpeciesChampions(Vec<(SpeciesID, G, usize)>),
    PopulationChampion(G),
    None,
}

/// A snapshot of a population, taken after evaluation.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation: usize,
    pub species_count: usize,
    pub sample: Sample<G>,
    /// Named statistics over the whole genome table.
    pub stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {} ({} species)",
            self.generation, self.species_count
        )?;
        for (name, stats) in &self.stats {
            write!(f, "\n  {}: {}", name, stats)?;
        }
        Ok(())
    }
}

/// Summary statistics of a sequence of values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Summarizes `data`, or returns `None` if it is empty.
    /// Even-length sequences take the mean of the two middle
    /// values as their median.
    ///
    /// # Examples
    /// ```
    /// use evoneat::logging::Stats;
    ///
    /// let stats = Stats::from_values([-2.0, -1.0, 0.5, 1.0, 1.5]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// assert_eq!(Stats::from_values([4.0, 1.0, 3.0, 2.0]).unwrap().median, 2.5);
    /// assert_eq!(Stats::from_values([]), None);
    /// ```
    pub fn from_values(data: impl IntoIterator<Item = f32>) -> Option<Stats> {
        let mut sorted: Vec<f32> = data.into_iter().collect();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        let (&minimum, &maximum) = (sorted.first()?, sorted.last()?);

        let len = sorted.len();
        let median = match len % 2 {
            0 => (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0,
            _ => sorted[len / 2],
        };
        Some(Stats {
            maximum,
            minimum,
            mean: sorted.iter().sum::<f32>() / len as f32,
            median,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.3}, min {:.3}, mean {:.3}, median {:.3}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// Keeps snapshots of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome + Clone> EvolutionLogger<G> {
    /// Returns an empty logger copying genomes
    /// according to `reporting_level`.
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::NNGenome as G;
    /// use evoneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of `population`.
    ///
    /// `genome_stat_extractor` measures `N` values on each
    /// genome, named by `stat_names`; the snapshot keeps
    /// [`Stats`] of each. Statistics over an empty
    /// population are skipped.
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use evoneat::{Population, PopulationConfig};
    /// use evoneat::logging::{EvolutionLogger, ReportingLevel, Sample};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut logger = EvolutionLogger::<G>::new(ReportingLevel::SpeciesChampions);
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(PopulationConfig::zero(), genetic_config).unwrap();
    ///
    /// // Do something with the population...
    /// population.evaluate_fitness(&mut |g: &G| g.nodes().count() as f32);
    /// // Then log a snapshot.
    /// logger.log(&population, &|g| [g.fitness().unwrap_or(0.0)], ["fitness"]);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.stats[0].1.maximum, 2.0);
    /// // Species are only formed by `evolve`.
    /// assert!(matches!(&log.sample, Sample::SpeciesChampions(champions) if champions.is_empty()));
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f32; N],
    {
        let rows = population.genomes().iter().map(genome_stat_extractor).collect();
        let stats = stat_names
            .iter()
            .zip(columns(rows))
            .filter_map(|(name, values)| Some((name.to_string(), Stats::from_values(values)?)))
            .collect();

        self.logs.push(Log {
            generation: population.generation(),
            species_count: population.species().len(),
            sample: self.sample(population),
            stats,
        })
    }

    fn sample<C, H>(&self, population: &Population<C, H, G>) -> Sample<G>
    where
        G: Genome<InnovationHistory = H, Config = C>,
    {
        let stagnation_of = |id| population.stagnation().stagnant_count(id).unwrap_or(0);
        let species = population.species().iter();
        match self.reporting_level {
            ReportingLevel::AllGenomes => Sample::Species(
                species
                    .map(|s| {
                        let members = population.members_of(s).cloned().collect();
                        (s.id(), members, stagnation_of(s.id()))
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => Sample::SpeciesChampions(
                species
                    .filter_map(|s| {
                        let champion = s.champion(population.genomes())?;
                        Some((s.id(), champion.clone(), stagnation_of(s.id())))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => population
                .champion()
                .cloned()
                .map_or(Sample::None, Sample::PopulationChampion),
            ReportingLevel::NoGenomes => Sample::None,
        }
    }

    /// Iterates over the stored snapshots, oldest first.
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::NNGenome as G;
    /// use evoneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::AllGenomes);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }
}

/// Transposes per-genome rows of measurements
/// into one column per measurement.
fn columns<const N: usize>(rows: Vec<[f32; N]>) -> [Vec<f32>; N] {
    let mut columns: [Vec<f32>; N] = std::array::from_fn(|_| Vec::with_capacity(rows.len()));
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }
    columns
}
