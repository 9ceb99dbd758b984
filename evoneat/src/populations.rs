//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a fitness evaluator
//! as the source of selective pressure.
mod config;
mod errors;
mod evaluation;
pub mod logging;
mod offspring_factory;
mod speciation;
mod species;
mod stagnation;
mod statistics;

use crate::{Genome, GenomeId, InnovationHistory};
pub use config::PopulationConfig;
pub use errors::{ConfigurationError, EvaluationError, EvolutionError};
#[cfg(feature = "parallel")]
pub use evaluation::ParallelEvaluator;
pub use evaluation::{Evaluation, Fallible, FitnessEvaluator, TimeoutEvaluator, FLOOR_FITNESS};
use logging::{RemovalReason, ReportEvent, Reporter};
use offspring_factory::{allot_offspring, OffspringFactory};
pub use speciation::{speciate, Speciation};
pub use species::{Species, SpeciesID};
pub use stagnation::{SpeciesFitnessFunc, SpeciesVerdict, Stagnation, StagnationRecord};
pub use statistics::Statistics;

use ahash::RandomState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use std::collections::HashMap;

/// The phase a population is in. Phases cycle from
/// `Idle` to `Reproducing` in declaration order; a
/// population is `Idle` before its first evaluation
/// and between generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PopulationState {
    #[default]
    Idle,
    Evaluating,
    Speciating,
    UpdatingStagnation,
    Reproducing,
    /// Every species was removed for stagnation.
    /// No further generation can be evaluated or bred.
    Extinct,
}

/// Summary of a call to [`Population::epoch`].
#[derive(Clone, Debug)]
pub struct EpochOutcome<G> {
    /// Number of generations evaluated.
    pub generations: usize,
    /// Whether the fitness threshold was reached.
    pub solved: bool,
    /// The fittest genome evaluated so far.
    pub champion: Option<G>,
}

/// A population of genomes.
///
/// The random number generator and the registered
/// reporters are not serialized; a deserialized
/// population draws fresh entropy and reports nowhere.
#[derive(Serialize, Deserialize)]
pub struct Population<C, H, G> {
    genomes: Vec<G>,
    species: Vec<Species<G>>,
    stagnation: Stagnation,
    history: H,
    generation: usize,
    next_genome_id: GenomeId,
    state: PopulationState,
    statistics: Statistics<G>,
    population_config: PopulationConfig,
    genetic_config: C,
    #[serde(skip, default = "StdRng::from_entropy")]
    rng: StdRng,
    #[serde(skip)]
    reporters: Vec<Box<dyn Reporter>>,
}

impl<C, H, G> Population<C, H, G>
where
    G: Genome<InnovationHistory = H, Config = C> + Clone,
{
    /// Creates a new population using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use evoneat::{Population, PopulationConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     size: std::num::NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// # let genetic_config = GeneticConfig::zero();
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let population = Population::<_, _, G>::new(pop_config, genetic_config).unwrap();
    /// assert_eq!(population.genomes().len(), 10);
    /// ```
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Result<Population<C, H, G>, ConfigurationError>
    where
        H: InnovationHistory<Config = C>,
    {
        Self::new_seeded(vec![], population_config, genetic_config)
    }

    /// Creates a new population using the passed configurations,
    /// and seeds it with the specified genomes. If the number of
    /// seed genomes is not as large as the configured population
    /// size, the remaining space is filled with random genomes,
    /// whose ids follow the largest seed id.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid, the
    /// configured population size is lesser than the number of
    /// seed genomes, or any of the genomes are incompatible with
    /// the specified genetic config, as established by
    /// [`Genome::conforms_to`].
    ///
    /// [`Genome::conforms_to`]: crate::Genome::conforms_to
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use evoneat::{Population, PopulationConfig};
    ///
    /// let pop_config = PopulationConfig {
    ///     // Set desired configuration
    ///     size: std::num::NonZeroUsize::new(100).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// # let genetic_config = GeneticConfig {
    /// #     weight_bound: 1.0,
    /// #     ..GeneticConfig::zero()
    /// # };
    /// # let g1 = NNGenome::new(0, &genetic_config);
    /// # let g2 = NNGenome::new(1, &genetic_config);
    /// # let g3 = NNGenome::new(2, &genetic_config);
    ///
    /// // With `seed` a list of a suitable type implementing `Genome`...
    /// let population = Population::new_seeded(vec![g1, g2, g3], pop_config, genetic_config).unwrap();
    ///
    /// # assert_eq!(population.genomes().len(), 100);
    /// # assert_eq!(population.genomes()[3].id(), 3);
    /// ```
    pub fn new_seeded(
        seeds: Vec<G>,
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Result<Population<C, H, G>, ConfigurationError>
    where
        H: InnovationHistory<Config = C>,
    {
        population_config.validate()?;
        G::check_config(&genetic_config)?;

        let size = population_config.size.get();
        if seeds.len() > size {
            return Err(ConfigurationError::TooManySeedGenomes {
                seeds: seeds.len(),
                size,
            });
        }
        if let Some(genome) = seeds.iter().find(|g| !g.conforms_to(&genetic_config)) {
            return Err(ConfigurationError::NonconformingSeedGenome(genome.id()));
        }

        let mut rng = match population_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut next_genome_id = seeds.iter().map(|g| g.id() + 1).max().unwrap_or(0);
        let mut genomes = seeds;
        while genomes.len() < size {
            genomes.push(G::new(next_genome_id, &genetic_config, &mut rng));
            next_genome_id += 1;
        }

        Ok(Population {
            genomes,
            species: vec![],
            stagnation: Stagnation::from_config(&population_config),
            history: H::new(&genetic_config),
            generation: 0,
            next_genome_id,
            state: PopulationState::Idle,
            statistics: Statistics::new(),
            population_config,
            genetic_config,
            rng,
            reporters: vec![],
        })
    }

    /// Registers a reporter, which will receive
    /// every subsequent [`ReportEvent`].
    pub fn add_reporter<R: Reporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Box::new(reporter));
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// Genomes whose evaluation fails, yields NaN, an
    /// infinity or a negative value, or is missing from
    /// the evaluator's results receive the [`FLOOR_FITNESS`].
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// # use evoneat_nn::networks::FunctionApproximatorNetwork;
    /// use evoneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::zero(),
    ///     genetic_config,
    /// ).unwrap();
    ///
    /// population.evaluate_fitness(&mut |g: &G| {
    ///     # let mut network = FunctionApproximatorNetwork::<1>::from(g);
    ///     # // Networks with outputs closer to 0 are given higher scores.
    ///     # let fitness = (1.0 - (network.evaluate_at(&[1.0])[0] - 0.0)).powf(2.0);
    ///     // Compute genome's fitness...
    ///     return fitness;
    /// });
    /// # assert!(population.champion().is_some());
    /// ```
    pub fn evaluate_fitness<E: FitnessEvaluator<G>>(&mut self, evaluator: &mut E) {
        let generation = self.generation;
        if self.state == PopulationState::Extinct {
            warn!(generation, "extinct population left unevaluated");
            return;
        }
        self.state = PopulationState::Evaluating;
        self.emit(ReportEvent::GenerationStarted { generation });

        let mut results: HashMap<GenomeId, Result<f32, EvaluationError>, RandomState> =
            evaluator.evaluate(&self.genomes).into_iter().collect();
        let mut failures = vec![];
        for genome in &mut self.genomes {
            let result = results
                .remove(&genome.id())
                .unwrap_or(Err(EvaluationError::Missing))
                .and_then(evaluation::validate_fitness);
            match result {
                Ok(fitness) => genome.set_fitness(fitness),
                Err(error) => {
                    genome.set_fitness(FLOOR_FITNESS);
                    failures.push((genome.id(), error));
                }
            }
        }

        for (genome, error) in failures {
            warn!(generation, genome, %error, "genome given floor fitness");
            self.emit(ReportEvent::EvaluationFailed {
                generation,
                genome,
                error: error.to_string(),
            });
        }

        let (best_fitness, mean_fitness) = self.statistics.record_evaluation(&self.genomes);
        info!(generation, best_fitness, mean_fitness, "generation evaluated");
        self.emit(ReportEvent::GenerationEvaluated {
            generation,
            best_fitness,
            mean_fitness,
        });
    }

    /// Evolves an evaluated population into the next
    /// generation: genomes are grouped into species,
    /// stagnant species are removed, and the survivors
    /// breed the next generation's genomes.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid
    /// (as it may be after deserialization), if a genome has
    /// not been evaluated, or if every species was removed
    /// for stagnation. Extinction is final: every later call
    /// fails with the same error.
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use evoneat::{Population, PopulationConfig, PopulationState};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// // With `G` a suitable type implementing `Genome`...
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(10).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    /// ).unwrap();
    ///
    /// assert!(population.evolve().is_err());
    ///
    /// population.evaluate_fitness(&mut |_: &G| 1.0);
    /// population.evolve().unwrap();
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.state(), PopulationState::Idle);
    /// ```
    pub fn evolve(&mut self) -> Result<(), EvolutionError>
    where
        H: InnovationHistory<Config = C>,
    {
        if self.state == PopulationState::Extinct {
            return Err(EvolutionError::Extinction {
                generation: self.generation,
            });
        }
        self.population_config.validate()?;
        G::check_config(&self.genetic_config)?;
        if let Some(genome) = self.genomes.iter().find(|g| g.fitness().is_none()) {
            return Err(EvolutionError::InvariantViolation(format!(
                "genome {} has not been evaluated",
                genome.id()
            )));
        }

        self.speciate_genomes();
        let verdicts = self.update_stagnation()?;
        self.reproduce(&verdicts)?;

        info!(
            generation = self.generation,
            species = self.species.len(),
            "generation completed"
        );
        self.emit(ReportEvent::GenerationCompleted {
            generation: self.generation,
            species_count: self.species.len(),
            population_size: self.genomes.len(),
        });
        self.generation += 1;
        self.state = PopulationState::Idle;
        Ok(())
    }

    /// Runs up to `num_generations` generations of evaluation
    /// and evolution. Stops right after the evaluation in which
    /// a genome reaches the configured [fitness threshold].
    ///
    /// # Errors
    /// Returns the first error raised by [`evolve`].
    ///
    /// [fitness threshold]: PopulationConfig::fitness_threshold
    /// [`evolve`]: Population::evolve
    ///
    /// # Examples
    /// ```
    /// # use evoneat_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use evoneat::{Population, PopulationConfig};
    ///
    /// # let genetic_config = GeneticConfig::zero();
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig {
    ///         size: std::num::NonZeroUsize::new(10).unwrap(),
    ///         fitness_threshold: Some(1.0),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     genetic_config,
    /// ).unwrap();
    ///
    /// let outcome = population.epoch(50, &mut |_: &G| 1.0).unwrap();
    /// assert!(outcome.solved);
    /// assert_eq!(outcome.generations, 1);
    /// ```
    pub fn epoch<E: FitnessEvaluator<G>>(
        &mut self,
        num_generations: usize,
        evaluator: &mut E,
    ) -> Result<EpochOutcome<G>, EvolutionError>
    where
        H: InnovationHistory<Config = C>,
    {
        for generations in 1..=num_generations {
            self.evaluate_fitness(evaluator);
            if let Some(threshold) = self.population_config.fitness_threshold {
                let best = self.champion().and_then(|g| g.fitness());
                if best.map_or(false, |best| best >= threshold) {
                    info!(generation = self.generation, threshold, "fitness threshold reached");
                    self.state = PopulationState::Idle;
                    return Ok(self.outcome(generations, true));
                }
            }
            self.evolve()?;
        }
        Ok(self.outcome(num_generations, false))
    }

    fn outcome(&self, generations: usize, solved: bool) -> EpochOutcome<G> {
        EpochOutcome {
            generations,
            solved,
            champion: self.statistics.best_genome().cloned(),
        }
    }

    /// Regroups the genome table into species.
    fn speciate_genomes(&mut self) {
        self.state = PopulationState::Speciating;
        let Speciation {
            species,
            created,
            discarded,
        } = speciate(
            &self.genomes,
            std::mem::take(&mut self.species),
            self.population_config.distance_threshold,
            &self.genetic_config,
            self.generation,
        );
        self.species = species;

        let generation = self.generation;
        for id in created {
            debug!(generation, species = ?id, "species created");
            self.emit(ReportEvent::SpeciesCreated {
                generation,
                species: id,
            });
        }
        for id in discarded {
            self.remove_species_record(id, RemovalReason::Empty);
        }
    }

    /// Updates every species' stagnation record.
    fn update_stagnation(&mut self) -> Result<Vec<SpeciesVerdict>, EvolutionError> {
        self.state = PopulationState::UpdatingStagnation;
        let member_fitnesses = self
            .species
            .iter()
            .map(|s| Ok((s.id(), s.member_fitnesses(&self.genomes)?)))
            .collect::<Result<Vec<_>, EvolutionError>>()?;

        let verdicts = self.stagnation.update(&member_fitnesses)?;
        self.statistics.record_species(self.generation, &verdicts);
        let counts = self
            .stagnation
            .records()
            .map(|(id, record)| (*id, record.stagnant_count))
            .collect();
        self.emit(ReportEvent::StagnationCounts {
            generation: self.generation,
            counts,
        });
        Ok(verdicts)
    }

    /// Removes stagnant species and replaces the genome
    /// table with the offspring of the survivors. Each
    /// child starts out as a member of its parent's
    /// species until the next speciation.
    fn reproduce(&mut self, verdicts: &[SpeciesVerdict]) -> Result<(), EvolutionError>
    where
        H: InnovationHistory<Config = C>,
    {
        self.state = PopulationState::Reproducing;
        let mut surviving = Vec::with_capacity(self.species.len());
        let mut stagnated = vec![];
        for (species, verdict) in std::mem::take(&mut self.species).into_iter().zip(verdicts) {
            if verdict.stagnant {
                stagnated.push(species.id());
            } else {
                surviving.push(species);
            }
        }
        for id in stagnated {
            debug!(generation = self.generation, species = ?id, "stagnant species removed");
            self.emit(ReportEvent::SpeciesRemoved {
                generation: self.generation,
                species: id,
                reason: RemovalReason::Stagnated,
            });
        }
        if surviving.is_empty() {
            warn!(generation = self.generation, "every species stagnated");
            self.state = PopulationState::Extinct;
            return Err(EvolutionError::Extinction {
                generation: self.generation,
            });
        }

        for species in &mut surviving {
            species.sort_members_by_decreasing_fitness(&self.genomes);
        }
        let adjusted_fitnesses: Vec<f32> = surviving
            .iter()
            .map(|s| s.adjusted_fitness(&self.genomes))
            .collect();
        let allotted = allot_offspring(
            &adjusted_fitnesses,
            self.population_config.size.get(),
            self.population_config.min_species_size,
        );

        self.history.start_generation();
        let offspring = OffspringFactory::new(
            &surviving,
            &self.genomes,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
            &mut self.next_genome_id,
        )
        .generate_offspring(&allotted);

        let mut genomes = Vec::with_capacity(self.population_config.size.get());
        let mut childless = vec![];
        for (mut species, children) in surviving.into_iter().zip(offspring) {
            species.members = (genomes.len()..genomes.len() + children.len()).collect();
            genomes.extend(children);
            if species.is_empty() {
                childless.push(species.id());
            } else {
                self.species.push(species);
            }
        }
        self.genomes = genomes;
        for id in childless {
            self.remove_species_record(id, RemovalReason::NoOffspring);
        }

        if self.genomes.len() != self.population_config.size.get() {
            return Err(EvolutionError::InvariantViolation(format!(
                "bred {} genomes for a population of {}",
                self.genomes.len(),
                self.population_config.size
            )));
        }
        Ok(())
    }

    fn remove_species_record(&mut self, id: SpeciesID, reason: RemovalReason) {
        self.stagnation.remove(id);
        debug!(generation = self.generation, species = ?id, ?reason, "species removed");
        self.emit(ReportEvent::SpeciesRemoved {
            generation: self.generation,
            species: id,
            reason,
        });
    }

    /// Delivers an event to every reporter.
    fn emit(&mut self, event: ReportEvent) {
        for reporter in &mut self.reporters {
            if let Err(error) = reporter.report(&event) {
                warn!(%error, ?event, "reporter failed to deliver event");
            }
        }
    }

    /// Returns the current genome table.
    pub fn genomes(&self) -> &[G] {
        &self.genomes
    }

    /// Returns the current species, in ascending ID order.
    ///
    /// After [`evolve`], members are the offspring each
    /// species produced; they are regrouped at the start
    /// of the next [`evolve`].
    ///
    /// [`evolve`]: Population::evolve
    pub fn species(&self) -> &[Species<G>] {
        &self.species
    }

    /// Iterates over a species' members.
    pub fn members_of<'a>(&'a self, species: &'a Species<G>) -> impl Iterator<Item = &'a G> {
        species.members().iter().filter_map(move |&i| self.genomes.get(i))
    }

    /// Returns the fittest evaluated genome of the
    /// current generation, or `None` if no genome
    /// has been evaluated.
    pub fn champion(&self) -> Option<&G> {
        self.genomes
            .iter()
            .filter(|g| g.fitness().is_some())
            .max_by(|a, b| a.fitness().unwrap_or(0.0).total_cmp(&b.fitness().unwrap_or(0.0)))
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the phase the population is in.
    pub fn state(&self) -> PopulationState {
        self.state
    }

    /// Returns the population's stagnation tracker.
    pub fn stagnation(&self) -> &Stagnation {
        &self.stagnation
    }

    /// Returns the population's running statistics.
    pub fn statistics(&self) -> &Statistics<G> {
        &self.statistics
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}

#[cfg(test)]
mod tests {
    use super::logging::EventLog;
    use super::*;
    use crate::testing::{PointConfig, PointGenome, PointHistory};

    use std::collections::HashSet;
    use std::error::Error;
    use std::num::NonZeroUsize;

    type PointPopulation = Population<PointConfig, PointHistory, PointGenome>;

    const GENETICS: PointConfig = PointConfig {
        spread: 1.0,
        step: 0.01,
    };

    fn config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            distance_threshold: 0.5,
            elitism: 1,
            survival_threshold: 0.5,
            sexual_reproduction_chance: 0.5,
            interspecies_mating_chance: 0.1,
            min_species_size: 1,
            max_stagnation: NonZeroUsize::new(5).unwrap(),
            species_elitism: 1,
            seed: Some(42),
            ..PopulationConfig::zero()
        }
    }

    fn closeness_to_one(g: &PointGenome) -> f32 {
        1.0 / (1.0 + (1.0 - g.value).abs())
    }

    struct BrokenReporter;

    impl Reporter for BrokenReporter {
        fn report(&mut self, _: &ReportEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("sink unavailable".into())
        }
    }

    #[test]
    fn new_population_is_idle_with_sequential_ids() {
        let population = PointPopulation::new(config(20), GENETICS).unwrap();
        let ids: Vec<_> = population.genomes().iter().map(|g| g.id).collect();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
        assert_eq!(population.state(), PopulationState::Idle);
        assert_eq!(population.generation(), 0);
        assert!(population.species().is_empty());
        assert!(population.champion().is_none());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let invalid = PopulationConfig {
            survival_threshold: 0.0,
            ..config(10)
        };
        assert!(matches!(
            PointPopulation::new(invalid, GENETICS),
            Err(ConfigurationError::OutOfRange {
                parameter: "survival_threshold",
                ..
            })
        ));
    }

    #[test]
    fn seeds_are_vetted() {
        let seeds = vec![PointGenome::at(7, 0.5), PointGenome::at(3, 0.1)];
        let population = PointPopulation::new_seeded(seeds, config(4), GENETICS).unwrap();
        let ids: Vec<_> = population.genomes().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![7, 3, 8, 9]);

        let too_many = (0..5).map(|i| PointGenome::at(i, 0.0)).collect();
        assert_eq!(
            PointPopulation::new_seeded(too_many, config(4), GENETICS).err(),
            Some(ConfigurationError::TooManySeedGenomes { seeds: 5, size: 4 })
        );

        let broken = vec![PointGenome::at(0, f32::NAN)];
        assert_eq!(
            PointPopulation::new_seeded(broken, config(4), GENETICS).err(),
            Some(ConfigurationError::NonconformingSeedGenome(0))
        );
    }

    #[test]
    fn equal_seeds_give_equal_runs() {
        let run = || {
            let mut population = PointPopulation::new(config(30), GENETICS).unwrap();
            population.epoch(5, &mut closeness_to_one).unwrap();
            population
                .genomes()
                .iter()
                .map(|g| (g.id, g.value))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn evolving_before_evaluation_is_an_invariant_violation() {
        let mut population = PointPopulation::new(config(10), GENETICS).unwrap();
        assert!(matches!(
            population.evolve(),
            Err(EvolutionError::InvariantViolation(_))
        ));
    }

    #[test]
    fn generations_keep_size_and_never_reuse_ids() {
        let mut population = PointPopulation::new(config(25), GENETICS).unwrap();
        let mut seen: HashSet<GenomeId> = population.genomes().iter().map(|g| g.id).collect();

        for generation in 1..=10 {
            population.evaluate_fitness(&mut closeness_to_one);
            let survivors: HashSet<GenomeId> =
                population.genomes().iter().map(|g| g.id).collect();
            population.evolve().unwrap();

            assert_eq!(population.generation(), generation);
            assert_eq!(population.state(), PopulationState::Idle);
            assert_eq!(population.genomes().len(), 25);
            for genome in population.genomes() {
                // Carried-over elites keep their id; everything else is new.
                assert!(survivors.contains(&genome.id) || seen.insert(genome.id));
                assert!(genome.fitness.is_none() || survivors.contains(&genome.id));
            }
        }
        assert_eq!(population.history().generations_started, 10);
    }

    #[test]
    fn species_members_partition_the_table() {
        let mut population = PointPopulation::new(config(40), GENETICS).unwrap();
        for _ in 0..3 {
            population.evaluate_fitness(&mut closeness_to_one);
            population.evolve().unwrap();

            let mut members: Vec<usize> = population
                .species()
                .iter()
                .flat_map(|s| s.members().iter().copied())
                .collect();
            members.sort_unstable();
            assert_eq!(members, (0..40).collect::<Vec<_>>());
            let ids: Vec<SpeciesID> = population.species().iter().map(|s| s.id()).collect();
            let mut sorted = ids.clone();
            sorted.sort();
            assert_eq!(ids, sorted);
        }
    }

    #[test]
    fn failed_evaluations_get_floor_fitness() {
        let mut population = PointPopulation::new(config(6), GENETICS).unwrap();
        let log = EventLog::new();
        population.add_reporter(log.clone());
        population.add_reporter(BrokenReporter);

        population.evaluate_fitness(&mut |g: &PointGenome| match g.id {
            0 => f32::NAN,
            1 => -3.0,
            _ => 2.0,
        });
        let fitnesses: Vec<_> = population.genomes().iter().map(|g| g.fitness).collect();
        assert_eq!(
            fitnesses,
            vec![Some(0.0), Some(0.0), Some(2.0), Some(2.0), Some(2.0), Some(2.0)]
        );
        let failed: Vec<GenomeId> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::EvaluationFailed { genome, .. } => Some(*genome),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec![0, 1]);
        assert_eq!(population.state(), PopulationState::Evaluating);
    }

    #[test]
    fn genomes_missing_from_results_get_floor_fitness() {
        struct SkipsFirst;
        impl FitnessEvaluator<PointGenome> for SkipsFirst {
            fn evaluate(&mut self, genomes: &[PointGenome]) -> Vec<Evaluation> {
                genomes.iter().skip(1).rev().map(|g| (g.id, Ok(1.0))).collect()
            }
        }

        let mut population = PointPopulation::new(config(3), GENETICS).unwrap();
        population.evaluate_fitness(&mut SkipsFirst);
        let fitnesses: Vec<_> = population.genomes().iter().map(|g| g.fitness).collect();
        assert_eq!(fitnesses, vec![Some(0.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn all_species_stagnant_is_extinction() {
        let config = PopulationConfig {
            distance_threshold: 10.0,
            max_stagnation: NonZeroUsize::MIN,
            species_elitism: 0,
            ..config(10)
        };
        let mut population = PointPopulation::new(config, GENETICS).unwrap();
        let mut flat = |_: &PointGenome| 1.0;

        population.evaluate_fitness(&mut flat);
        population.evolve().unwrap();
        population.evaluate_fitness(&mut flat);
        assert_eq!(
            population.evolve(),
            Err(EvolutionError::Extinction { generation: 1 })
        );
        assert_eq!(population.state(), PopulationState::Extinct);

        population.evaluate_fitness(&mut flat);
        assert_eq!(
            population.evolve(),
            Err(EvolutionError::Extinction { generation: 1 })
        );
        assert!(population.epoch(3, &mut flat).is_err());
        assert_eq!(population.generation(), 1);
        assert_eq!(population.state(), PopulationState::Extinct);
    }

    #[test]
    fn invalid_configuration_stops_evolution() {
        let mut population = PointPopulation::new(config(10), GENETICS).unwrap();
        let mut saved = serde_json::to_value(&population).unwrap();
        saved["population_config"]["survival_threshold"] = serde_json::json!(0.0);
        population = serde_json::from_value(saved).unwrap();

        population.evaluate_fitness(&mut closeness_to_one);
        assert!(matches!(
            population.evolve(),
            Err(EvolutionError::Configuration(ConfigurationError::OutOfRange {
                parameter: "survival_threshold",
                ..
            }))
        ));
        assert_eq!(population.generation(), 0);
    }

    #[test]
    fn species_elitism_prevents_extinction() {
        let config = PopulationConfig {
            distance_threshold: 10.0,
            max_stagnation: NonZeroUsize::MIN,
            species_elitism: 1,
            ..config(10)
        };
        let mut population = PointPopulation::new(config, GENETICS).unwrap();
        let outcome = population.epoch(10, &mut |_: &PointGenome| 1.0).unwrap();
        assert_eq!(outcome.generations, 10);
        assert!(!outcome.solved);
        assert_eq!(population.species().len(), 1);
    }

    #[test]
    fn epoch_stops_at_fitness_threshold() {
        let config = PopulationConfig {
            fitness_threshold: Some(0.9),
            ..config(20)
        };
        let mut population = PointPopulation::new(config, GENETICS).unwrap();
        let outcome = population.epoch(1000, &mut closeness_to_one).unwrap();

        assert!(outcome.solved);
        assert!(outcome.generations < 1000);
        assert_eq!(population.generation() + 1, outcome.generations);
        let champion = outcome.champion.unwrap();
        assert!(champion.fitness.unwrap() >= 0.9);
        assert_eq!(
            population.statistics().best_fitness_history().len(),
            outcome.generations
        );
    }

    #[test]
    fn events_follow_generation_phases() {
        let mut population = PointPopulation::new(config(10), GENETICS).unwrap();
        let log = EventLog::new();
        population.add_reporter(log.clone());
        population.evaluate_fitness(&mut closeness_to_one);
        population.evolve().unwrap();

        let events = log.events();
        assert_eq!(events[0], ReportEvent::GenerationStarted { generation: 0 });
        assert!(matches!(events[1], ReportEvent::GenerationEvaluated { generation: 0, .. }));
        assert!(matches!(events[2], ReportEvent::SpeciesCreated { generation: 0, .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, ReportEvent::StagnationCounts { .. })));
        assert!(matches!(
            events.last(),
            Some(ReportEvent::GenerationCompleted {
                generation: 0,
                population_size: 10,
                ..
            })
        ));
    }
}
