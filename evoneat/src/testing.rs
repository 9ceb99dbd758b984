//! A one-dimensional genome for exercising the engine
//! without depending on a concrete network genome.
use crate::{Genome, GenomeId, InnovationHistory};

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PointConfig {
    /// New genomes get a value in `[0, spread)`.
    pub spread: f32,
    /// Every mutation moves the value by this amount.
    pub step: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct PointHistory {
    pub generations_started: usize,
}

impl InnovationHistory for PointHistory {
    type Config = PointConfig;

    fn new(_config: &PointConfig) -> Self {
        PointHistory::default()
    }

    fn start_generation(&mut self) {
        self.generations_started += 1;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PointGenome {
    pub id: GenomeId,
    pub value: f32,
    pub fitness: Option<f32>,
}

impl PointGenome {
    pub fn at(id: GenomeId, value: f32) -> PointGenome {
        PointGenome {
            id,
            value,
            fitness: None,
        }
    }

    pub fn evaluated(id: GenomeId, value: f32, fitness: f32) -> PointGenome {
        PointGenome {
            id,
            value,
            fitness: Some(fitness),
        }
    }
}

impl Genome for PointGenome {
    type Config = PointConfig;
    type InnovationHistory = PointHistory;

    fn new<R: Rng + ?Sized>(id: GenomeId, config: &PointConfig, rng: &mut R) -> Self {
        PointGenome::at(id, rng.gen::<f32>() * config.spread)
    }

    fn conforms_to(&self, _config: &PointConfig) -> bool {
        self.value.is_finite()
    }

    fn id(&self) -> GenomeId {
        self.id
    }

    fn genetic_distance(first: &Self, second: &Self, _config: &PointConfig) -> f32 {
        (first.value - second.value).abs()
    }

    fn mate<R: Rng + ?Sized>(
        id: GenomeId,
        parent1: &Self,
        parent2: &Self,
        _history: &mut PointHistory,
        config: &PointConfig,
        _rng: &mut R,
    ) -> Self {
        PointGenome::at(id, (parent1.value + parent2.value) / 2.0 + config.step)
    }

    fn clone_mutated<R: Rng + ?Sized>(
        id: GenomeId,
        parent: &Self,
        _history: &mut PointHistory,
        config: &PointConfig,
        _rng: &mut R,
    ) -> Self {
        PointGenome::at(id, parent.value + config.step)
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}
