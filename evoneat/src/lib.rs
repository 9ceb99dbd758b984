//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes are evolved generation by generation: every genome is
//! evaluated, grouped into a species of compatible genomes, species
//! that stop improving are culled (sparing the best few), and the
//! surviving species breed the next generation in proportion to
//! their fitness.
//!
//! The engine is generic over genomic structure through the
//! [`Genome`] trait. A neural network-based genome representation,
//! as in the original algorithm, is supplied by the `evoneat-nn` crate.
//!
//! Progress is logged through [`tracing`](https://docs.rs/tracing);
//! install a subscriber to see it. Structured events can also be
//! received through a [`Reporter`](logging::Reporter).
//!
//! # Example usage: evolving a custom genome
//! Any type implementing [`Genome`] can be evolved. Here each
//! genome is a single number, and fitness rewards closeness to 42.
//! ```
//! use evoneat::{Genome, GenomeId, InnovationHistory, Population, PopulationConfig};
//! use rand::Rng;
//! use std::num::NonZeroUsize;
//!
//! #[derive(Clone)]
//! struct Step(f32);
//!
//! struct NoHistory;
//!
//! impl InnovationHistory for NoHistory {
//!     type Config = Step;
//!     fn new(_: &Step) -> Self {
//!         NoHistory
//!     }
//!     fn start_generation(&mut self) {}
//! }
//!
//! #[derive(Clone)]
//! struct Guess {
//!     id: GenomeId,
//!     value: f32,
//!     fitness: Option<f32>,
//! }
//!
//! impl Genome for Guess {
//!     type Config = Step;
//!     type InnovationHistory = NoHistory;
//!
//!     fn new<R: Rng + ?Sized>(id: GenomeId, _: &Step, rng: &mut R) -> Self {
//!         Guess { id, value: rng.gen_range(0.0..100.0), fitness: None }
//!     }
//!     fn conforms_to(&self, _: &Step) -> bool {
//!         true
//!     }
//!     fn id(&self) -> GenomeId {
//!         self.id
//!     }
//!     fn genetic_distance(first: &Self, second: &Self, _: &Step) -> f32 {
//!         (first.value - second.value).abs()
//!     }
//!     fn mate<R: Rng + ?Sized>(
//!         id: GenomeId, a: &Self, b: &Self, _: &mut NoHistory, step: &Step, rng: &mut R,
//!     ) -> Self {
//!         let mid = Guess { id, value: (a.value + b.value) / 2.0, fitness: None };
//!         Self::clone_mutated(id, &mid, &mut NoHistory, step, rng)
//!     }
//!     fn clone_mutated<R: Rng + ?Sized>(
//!         id: GenomeId, parent: &Self, _: &mut NoHistory, step: &Step, rng: &mut R,
//!     ) -> Self {
//!         let value = parent.value + rng.gen_range(-step.0..=step.0);
//!         Guess { id, value, fitness: None }
//!     }
//!     fn set_fitness(&mut self, fitness: f32) {
//!         self.fitness = Some(fitness);
//!     }
//!     fn fitness(&self) -> Option<f32> {
//!         self.fitness
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PopulationConfig {
//!         size: NonZeroUsize::new(50).unwrap(),
//!         distance_threshold: 10.0,
//!         elitism: 1,
//!         survival_threshold: 0.5,
//!         sexual_reproduction_chance: 0.5,
//!         max_stagnation: NonZeroUsize::new(10).unwrap(),
//!         species_elitism: 1,
//!         fitness_threshold: Some(99.0),
//!         seed: Some(7),
//!         ..PopulationConfig::zero()
//!     };
//!     let mut population = Population::<_, _, Guess>::new(config, Step(2.0))?;
//!
//!     let outcome = population.epoch(200, &mut |g: &Guess| (100.0 - (g.value - 42.0).abs()).max(0.0))?;
//!     let best = outcome.champion.expect("evaluated at least once");
//!     assert!(best.fitness() >= population.statistics().best_fitness_history().first().copied());
//!     println!("best guess {} after {} generations", best.value, outcome.generations);
//!     Ok(())
//! }
//! ```
//!
//! See the `evoneat-nn` crate for network genomes, and
//! the `xor` binary for a complete experiment.

mod genome;
mod populations;
#[cfg(test)]
mod testing;

pub use genome::*;
pub use populations::*;
