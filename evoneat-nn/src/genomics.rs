//! Network genomes: nodes, the genes linking them, and the
//! innovation history that keeps their numbering consistent
//! across a population. Structural mutations only ever add
//! nodes and genes, so networks grow more complex over time.

mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use config::GeneticConfig;
use errors::*;
pub use genes::Gene;
pub use history::{History, NodeInnovation};
pub use nodes::{ActivationType, Node, NodeType};

use crate::Innovation;
use evoneat::{ConfigurationError, Genome, GenomeId};

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt;

/// A mutable collection of genes and nodes, with an
/// identifier and an optional fitness score.
///
/// Genes and nodes are keyed by their innovation numbers,
/// and iterated in ascending order.
///
/// Serializable with serde, for saving and reloading genomes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NNGenome {
    id: GenomeId,
    genes: BTreeMap<Innovation, Gene>,
    nodes: BTreeMap<Innovation, Node>,
    node_pairings: HashSet<(Innovation, Innovation), RandomState>,
    fitness: Option<f32>,
}

impl NNGenome {
    /// Creates a genome of sensors and actuators, drawing
    /// from the thread-local random number generator.
    ///
    /// Each sensor-actuator gene is present with the
    /// `initial_expression_chance`, and always carries the
    /// number `o + i ⨯ output_count` for sensor `i` and
    /// actuator index `o`. Mutations number their genes from
    /// `input_count ⨯ output_count` upwards.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome, NodeType};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = NNGenome::new(0, &config);
    ///
    /// // 3 sensors and 2 actuators, no hidden nodes.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Sensor).count(), 3);
    /// assert_eq!(genome.nodes().filter(|n| n.node_type() == NodeType::Actuator).count(), 2);
    ///
    /// // Every sensor-actuator pair is linked, with canonical numbers.
    /// assert_eq!(genome.genes().count(), 3 * 2);
    /// assert!(genome.genes().all(|g| g.weight().abs() <= config.weight_bound));
    /// assert!(genome.genes().all(|g| (0..3 * 2).contains(&g.innovation())));
    ///
    /// // New genomes are unevaluated.
    /// assert_eq!(genome.fitness(), None);
    /// ```
    pub fn new(id: GenomeId, config: &GeneticConfig) -> NNGenome {
        Self::with_rng(id, config, &mut rand::thread_rng())
    }

    /// Create a new genome with the specified configuration,
    /// drawing random values from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(id: GenomeId, config: &GeneticConfig, rng: &mut R) -> NNGenome {
        let mut genome = NNGenome {
            id,
            genes: BTreeMap::new(),
            nodes: Self::generate_nodes(config),
            node_pairings: HashSet::default(),
            fitness: None,
        };
        genome.generate_initial_genes(config, rng);
        genome
    }

    fn generate_nodes(config: &GeneticConfig) -> BTreeMap<Innovation, Node> {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        let sensors =
            (0..input_count).map(|i| (i, Node::new(i, NodeType::Sensor, ActivationType::Identity)));
        let actuators = (0..output_count).map(|o| {
            let activation_type = config
                .output_activation_types
                .get(o)
                .copied()
                .unwrap_or(ActivationType::Sigmoid);
            let id = o + input_count;
            (id, Node::new(id, NodeType::Actuator, activation_type))
        });

        sensors.chain(actuators).collect()
    }

    fn generate_initial_genes<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();

        for i in 0..input_count {
            for o in 0..output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let weight = Gene::random_weight(config, rng);
                    self.insert_gene_unchecked(Gene::new(
                        o + i * output_count,
                        i,
                        o + input_count,
                        weight,
                    ));
                }
            }
        }
    }

    /// Add a new gene to the genome.
    /// Returns a reference to the new gene.
    ///
    /// # Errors
    ///
    /// This function returns an error if a gene with the same
    /// `gene_id` or the same endpoints already existed in the genome,
    /// if either `input_id` or `output_id` do not correspond to nodes
    /// present in the genome, or if `output_id` corresponds to a
    /// sensor node.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 0.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = NNGenome::new(0, &config);
    ///
    /// // The genome is initially empty.
    /// assert_eq!(genome.genes().count(), 0);
    ///
    /// let inserted_gene = genome.add_gene(42, 2, 4, 2.5).unwrap().clone();
    ///
    /// assert_eq!(&inserted_gene, genome.genes().next().unwrap());
    /// assert_eq!(inserted_gene.innovation(), 42);
    /// assert_eq!(inserted_gene.endpoints(), (2, 4));
    /// assert_eq!(inserted_gene.weight(), 2.5);
    ///
    /// // Make a cycle (gene 43 goes 3 -> 4, gene 44 goes 4 -> 3).
    /// genome.add_gene(43, 3, 4, -3.0).unwrap();
    /// genome.add_gene(44, 4, 3, 1.0).unwrap();
    ///
    /// // Recursive gene.
    /// genome.add_gene(45, 4, 4, -1.0).unwrap();
    ///
    /// // Genes may not point into sensors.
    /// assert!(genome.add_gene(46, 4, 0, 1.0).is_err());
    /// ```
    pub fn add_gene(
        &mut self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        weight: f32,
    ) -> Result<&mut Gene, impl Error> {
        if let Err(e) = self.check_gene_viability(gene_id, input_id, output_id) {
            return Err(e);
        }
        Ok(self.insert_gene_unchecked(Gene::new(gene_id, input_id, output_id, weight)))
    }

    /// Links a gene into the genome, assuming
    /// it passes [`check_gene_viability`].
    ///
    /// [`check_gene_viability`]: NNGenome::check_gene_viability
    fn insert_gene_unchecked(&mut self, gene: Gene) -> &mut Gene {
        let (input_id, output_id) = gene.endpoints();
        if let Some(input) = self.nodes.get_mut(&input_id) {
            input.add_output_gene(gene.innovation());
        }
        if let Some(output) = self.nodes.get_mut(&output_id) {
            output.add_input_gene(gene.innovation());
        }
        self.node_pairings.insert((input_id, output_id));
        self.genes.entry(gene.innovation()).or_insert(gene)
    }

    fn check_gene_viability(
        &self,
        gene_id: Innovation,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Result<(), StructureError> {
        use StructureError::*;
        if self.genes.contains_key(&gene_id) {
            Err(DuplicateGene(gene_id, Some((input_id, output_id))))
        } else if !(self.nodes.contains_key(&input_id) && self.nodes.contains_key(&output_id)) {
            Err(MissingEndpoints(input_id, output_id))
        } else if self.node_pairings.contains(&(input_id, output_id)) {
            Err(DuplicateEndpoints(gene_id, (input_id, output_id)))
        } else if self.nodes[&output_id].node_type() == NodeType::Sensor {
            Err(SensorOutput(output_id))
        } else {
            Ok(())
        }
    }

    /// Add a new hidden node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Errors
    ///
    /// This function returns an error if a node of the
    /// same ID already existed in the genome.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{ActivationType, GeneticConfig, NNGenome, NodeType};
    ///
    /// let mut genome = NNGenome::new(0, &GeneticConfig::zero());
    ///
    /// let inserted_node = genome.add_node(42, ActivationType::Gaussian).unwrap().clone();
    ///
    /// assert_eq!(genome.nodes().count(), 1 + 1 + 1);
    /// assert_eq!(inserted_node.node_type(), NodeType::Neuron);
    /// assert_eq!(genome.node(42), Some(&inserted_node));
    ///
    /// assert!(genome.add_node(42, ActivationType::Sigmoid).is_err());
    /// ```
    pub fn add_node(
        &mut self,
        node_id: Innovation,
        activation_type: ActivationType,
    ) -> Result<&mut Node, impl Error> {
        if self.nodes.contains_key(&node_id) {
            return Err(StructureError::DuplicateNode(node_id));
        }
        Ok(self.insert_node_unchecked(node_id, activation_type))
    }

    fn insert_node_unchecked(
        &mut self,
        node_id: Innovation,
        activation_type: ActivationType,
    ) -> &mut Node {
        self.nodes
            .entry(node_id)
            .or_insert_with(|| Node::new(node_id, NodeType::Neuron, activation_type))
    }

    /// Applies each mutation to the genome independently,
    /// with its configured probability. Failed structural
    /// mutations leave the genome unchanged.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < config.weight_mutation_chance {
            self.mutate_weights(config, rng);
        }
        if rng.gen::<f32>() < config.toggle_expression_chance {
            self.mutate_toggle_expression(rng);
        }
        if rng.gen::<f32>() < config.node_addition_mutation_chance {
            let _ = self.mutate_add_node(history, config, rng);
        }
        if rng.gen::<f32>() < config.gene_addition_mutation_chance {
            let _ = self.mutate_add_gene(history, config, rng);
        }
    }

    /// Induces a _weight mutation_ in the genome.
    ///
    /// Every gene weight and every non-sensor bias is either
    /// reset (with chance [`weight_reset_chance`]) to a random value
    /// in `[-weight_bound, weight_bound]`, or otherwise nudged (with
    /// chance [`weight_nudge_chance`]) by a random value in
    /// `[-weight_mutation_power, weight_mutation_power]` and clamped.
    ///
    /// [`weight_reset_chance`]: GeneticConfig::weight_reset_chance
    /// [`weight_nudge_chance`]: GeneticConfig::weight_nudge_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     weight_mutation_power: 2.5,
    ///     weight_nudge_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = NNGenome::new(0, &config);
    /// let initial_weight = genome.genes().next().unwrap().weight();
    ///
    /// genome.mutate_weights(&config, &mut rand::thread_rng());
    /// let new_weight = genome.genes().next().unwrap().weight();
    ///
    /// assert!(new_weight.abs() <= config.weight_bound);
    /// assert!((new_weight - initial_weight).abs() <= config.weight_mutation_power);
    /// ```
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for gene in self.genes.values_mut() {
            if rng.gen::<f32>() < config.weight_reset_chance {
                gene.randomize_weight(config, rng);
            } else if rng.gen::<f32>() < config.weight_nudge_chance {
                gene.nudge_weight(config, rng);
            }
        }
        let biased = self
            .nodes
            .values_mut()
            .filter(|n| n.node_type() != NodeType::Sensor);
        for node in biased {
            if rng.gen::<f32>() < config.weight_reset_chance {
                node.set_bias(Gene::random_weight(config, rng));
            } else if rng.gen::<f32>() < config.weight_nudge_chance {
                node.set_bias(Gene::nudged(node.bias(), config, rng));
            }
        }
    }

    /// Flips the expression of a random gene.
    /// Returns the affected gene's innovation number,
    /// or `None` if the genome has no genes.
    pub fn mutate_toggle_expression<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Innovation> {
        let gene = self.genes.values_mut().choose(rng)?;
        gene.set_enabled(!gene.enabled());
        Some(gene.innovation())
    }

    /// Induces a _gene mutation_ in the genome, connecting
    /// two previously unconnected nodes.
    /// If successful, returns the newly added gene.
    ///
    /// # Errors
    ///
    /// Returns an error if no viable pair of nodes
    /// exists or [too many] attempts have failed.
    ///
    /// [too many]: crate::genomics::GeneticConfig::max_gene_addition_mutation_attempts
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, History, NNGenome};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 0.0,
    ///     weight_bound: 5.0,
    ///     max_gene_addition_mutation_attempts: 2,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = NNGenome::new(0, &config);
    /// assert_eq!(genome.genes().count(), 0);
    ///
    /// genome
    ///     .mutate_add_gene(&mut History::new(&config), &config, &mut rand::thread_rng())
    ///     .unwrap();
    ///
    /// assert_eq!(genome.genes().count(), 1);
    /// ```
    pub fn mutate_add_gene<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<&Gene, Box<dyn Error>> {
        let potential_outputs = self.non_sensor_nodes();
        let mut potential_inputs: Vec<Innovation> = self
            .nodes
            .keys()
            .copied()
            .filter(|&i| {
                potential_outputs
                    .iter()
                    .any(|&o| !self.node_pairings.contains(&(i, o)))
            })
            .collect();

        if potential_inputs.is_empty() {
            return Err(MutationError::FullyConnected.into());
        }
        potential_inputs.shuffle(rng);

        let (input, output) = potential_inputs
            .iter()
            .take(config.max_gene_addition_mutation_attempts)
            .find_map(|&i| {
                self.choose_output_node_for(i, &potential_outputs, config, rng)
                    .map(|o| (i, o))
            })
            .ok_or(MutationError::NoViablePair)?;

        let gene_id = history.gene_innovation(input, output);
        self.check_gene_viability(gene_id, input, output)?;
        let weight = Gene::random_weight(config, rng);
        Ok(self.insert_gene_unchecked(Gene::new(gene_id, input, output, weight)))
    }

    fn non_sensor_nodes(&self) -> BTreeSet<Innovation> {
        self.nodes
            .values()
            .filter(|n| n.node_type() != NodeType::Sensor)
            .map(Node::innovation)
            .collect()
    }

    /// Picks an output for a new gene leaving `input`. A self-loop
    /// is chosen with [`recursion_chance`] if it is absent.
    ///
    /// [`recursion_chance`]: GeneticConfig::recursion_chance
    fn choose_output_node_for<R: Rng + ?Sized>(
        &self,
        input: Innovation,
        potential_outputs: &BTreeSet<Innovation>,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Option<Innovation> {
        let can_recurse = potential_outputs.contains(&input)
            && !self.node_pairings.contains(&(input, input));
        if can_recurse && rng.gen::<f32>() < config.recursion_chance {
            Some(input)
        } else {
            potential_outputs
                .iter()
                .copied()
                .filter(|&o| o != input && !self.node_pairings.contains(&(input, o)))
                .choose(rng)
        }
    }

    /// Induces a _node mutation_ in the genome, splitting
    /// a random enabled gene in two.
    /// If succesful, returns the triplet (_in gene_, _new node_, _out gene_)
    /// as a tuple of references.
    ///
    /// The split gene is disabled; the in gene has a weight of 1.0
    /// and the out gene inherits the split gene's weight.
    ///
    /// # Errors
    ///
    /// This function returns an error if there are no enabled
    /// genes in the genome that could be split.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{ActivationType, GeneticConfig, History, NNGenome, NodeType};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     activation_types: vec![ActivationType::Gaussian],
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = NNGenome::new(0, &config);
    /// let prev_gene = genome.genes().next().unwrap().clone();
    ///
    /// let (new_input_gene, new_node, new_output_gene) = genome
    ///     .mutate_add_node(&mut History::new(&config), &config, &mut rand::thread_rng())
    ///     .unwrap();
    ///
    /// assert_eq!(new_input_gene.output(), new_node.innovation());
    /// assert_eq!(new_input_gene.weight(), 1.0);
    /// assert_eq!(new_output_gene.input(), new_node.innovation());
    /// assert_eq!(new_output_gene.weight(), prev_gene.weight());
    /// assert_eq!(new_node.activation_type(), ActivationType::Gaussian);
    /// assert_eq!(new_node.node_type(), NodeType::Neuron);
    ///
    /// assert_eq!(genome.genes().count(), 1 + 2);
    /// assert!(!genome.gene(prev_gene.innovation()).unwrap().enabled());
    /// ```
    pub fn mutate_add_node<R: Rng + ?Sized>(
        &mut self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(&Gene, &Node, &Gene), Box<dyn Error>> {
        let (split_gene, endpoints, weight) = self
            .genes
            .values()
            .filter(|g| g.enabled())
            .choose(rng)
            .map(|g| (g.innovation(), g.endpoints(), g.weight()))
            .ok_or(MutationError::NoEnabledGene)?;

        let (input_gene, new_node, output_gene) = match history.recorded_node_innovation(split_gene)
        {
            Some(record) if !self.contains_node_innovation(record) => record,
            _ => history.add_node_innovation(split_gene, endpoints),
        };
        let activation_type = config
            .activation_types
            .choose(rng)
            .copied()
            .unwrap_or(ActivationType::Sigmoid);

        if let Some(gene) = self.genes.get_mut(&split_gene) {
            gene.set_enabled(false);
        }
        self.insert_node_unchecked(new_node, activation_type);
        self.insert_gene_unchecked(Gene::new(input_gene, endpoints.0, new_node, 1.0));
        self.insert_gene_unchecked(Gene::new(output_gene, new_node, endpoints.1, weight));

        Ok((
            &self.genes[&input_gene],
            &self.nodes[&new_node],
            &self.genes[&output_gene],
        ))
    }

    /// Whether any part of a node mutation's
    /// numbers is already used by the genome.
    fn contains_node_innovation(&self, record: NodeInnovation) -> bool {
        let (input_gene, new_node, output_gene) = record;
        self.nodes.contains_key(&new_node)
            || self.genes.contains_key(&input_gene)
            || self.genes.contains_key(&output_gene)
    }

    /// Combines two genomes into an unmutated, unevaluated child.
    ///
    /// Genes are aligned by innovation number. Genes common to both
    /// parents take their weight from either parent at random, or the
    /// average of both with chance [`mate_by_averaging_chance`]; if
    /// disabled in either parent, they are re-enabled with chance
    /// [`reenable_chance`]. Genes present in only one parent are
    /// inherited with chance [`noncommon_inheritance_chance`] if that
    /// parent is at least as fit as the other, and with the
    /// complementary chance otherwise. A gene whose endpoints are
    /// already connected in the child is skipped.
    ///
    /// [`mate_by_averaging_chance`]: GeneticConfig::mate_by_averaging_chance
    /// [`reenable_chance`]: GeneticConfig::reenable_chance
    /// [`noncommon_inheritance_chance`]: GeneticConfig::noncommon_inheritance_chance
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, History, NNGenome};
    /// use std::collections::HashSet;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 0.5,
    ///     noncommon_inheritance_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut rng = rand::thread_rng();
    ///
    /// let mut genome1 = NNGenome::new(0, &config);
    /// let mut genome2 = NNGenome::new(1, &config);
    /// genome1.set_fitness(2.0);
    /// genome2.set_fitness(1.0);
    ///
    /// let child = NNGenome::crossover(2, &genome1, &genome2, &config, &mut rng);
    ///
    /// // The child holds exactly the fitter parent's genes.
    /// let child_genes: HashSet<_> = child.genes().map(|g| g.innovation()).collect();
    /// let fitter_genes: HashSet<_> = genome1.genes().map(|g| g.innovation()).collect();
    /// assert_eq!(child_genes, fitter_genes);
    /// assert_eq!(child.fitness(), None);
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        id: GenomeId,
        parent1: &NNGenome,
        parent2: &NNGenome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> NNGenome {
        let fitness1 = parent1.fitness.unwrap_or(0.0);
        let fitness2 = parent2.fitness.unwrap_or(0.0);
        let inheritance_chance = |own: f32, other: f32| {
            if own >= other {
                config.noncommon_inheritance_chance
            } else {
                1.0 - config.noncommon_inheritance_chance
            }
        };
        let chance1 = inheritance_chance(fitness1, fitness2);
        let chance2 = inheritance_chance(fitness2, fitness1);

        let mut child = NNGenome {
            id,
            genes: BTreeMap::new(),
            nodes: BTreeMap::new(),
            node_pairings: HashSet::default(),
            fitness: None,
        };
        let (fitter, weaker) = if fitness1 >= fitness2 {
            (parent1, parent2)
        } else {
            (parent2, parent1)
        };
        for parent in [fitter, weaker] {
            for node in parent.nodes.values() {
                if node.node_type() != NodeType::Neuron {
                    child
                        .nodes
                        .entry(node.innovation())
                        .or_insert_with(|| node.unlinked());
                }
            }
        }

        let innovations: BTreeSet<Innovation> = parent1
            .genes
            .keys()
            .chain(parent2.genes.keys())
            .copied()
            .collect();
        for innovation in innovations {
            match (parent1.genes.get(&innovation), parent2.genes.get(&innovation)) {
                (Some(gene1), Some(gene2)) => {
                    let (source, mut gene) = if rng.gen::<f32>() < config.mate_by_averaging_chance {
                        let mut gene = gene1.clone();
                        gene.set_weight((gene1.weight() + gene2.weight()) / 2.0);
                        (parent1, gene)
                    } else if rng.gen::<bool>() {
                        (parent1, gene1.clone())
                    } else {
                        (parent2, gene2.clone())
                    };
                    let enabled = (gene1.enabled() && gene2.enabled())
                        || rng.gen::<f32>() < config.reenable_chance;
                    gene.set_enabled(enabled);
                    child.inherit_gene(gene, source);
                }
                (Some(gene), None) => {
                    if rng.gen::<f32>() < chance1 {
                        child.inherit_gene(gene.clone(), parent1);
                    }
                }
                (None, Some(gene)) => {
                    if rng.gen::<f32>() < chance2 {
                        child.inherit_gene(gene.clone(), parent2);
                    }
                }
                (None, None) => {}
            }
        }

        child
    }

    /// Adds `gene` along with its endpoint nodes from `source`,
    /// unless its innovation number or endpoints are taken.
    fn inherit_gene(&mut self, gene: Gene, source: &NNGenome) {
        let (input, output) = gene.endpoints();
        if self.genes.contains_key(&gene.innovation()) || self.node_pairings.contains(&(input, output))
        {
            return;
        }
        for endpoint in [input, output] {
            if let Some(node) = source.nodes.get(&endpoint) {
                self.nodes.entry(endpoint).or_insert_with(|| node.unlinked());
            }
        }
        if self.nodes.contains_key(&input) && self.nodes.contains_key(&output) {
            self.insert_gene_unchecked(gene);
        }
    }

    /// Calculates the _genetic distance_ between `first` and `second`,
    /// weighting excess genes, disjoint genes and the mean weight
    /// difference of common genes as specified in `config`.
    ///
    /// Genes beyond the other genome's highest innovation number are
    /// excess; other unmatched genes are disjoint. The weight term is
    /// zero if the genomes share no genes.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// // Completely arbitrary quantities.
    /// const EXCESS_FACTOR: f32 = 1.5;
    /// const DISJOINT_FACTOR: f32 = 0.5;
    /// const WEIGHT_FACTOR: f32 = 0.25;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome1 = NNGenome::new(0, &config);
    /// let mut genome2 = NNGenome::new(1, &config);
    ///
    /// genome1.add_node(3, ActivationType::Sigmoid).unwrap();
    /// genome2.add_node(3, ActivationType::Sigmoid).unwrap();
    ///
    /// // Common gene, weight difference of 2.0.
    /// genome1.add_gene(0, 0, 2, 1.0).unwrap();
    /// genome2.add_gene(0, 0, 2, -1.0).unwrap();
    ///
    /// // Disjoint genes.
    /// genome1.add_gene(1, 1, 2, 3.0).unwrap();
    /// genome2.add_gene(2, 1, 3, 1.0).unwrap();
    ///
    /// // Common gene, weight_difference of 0.0.
    /// genome1.add_gene(3, 2, 3, 1.0).unwrap();
    /// genome2.add_gene(3, 2, 3, 1.0).unwrap();
    ///
    /// // Excess gene.
    /// genome1.add_gene(4, 2, 2, 3.0).unwrap();
    ///
    /// assert_eq!(
    ///     NNGenome::genetic_distance(&genome1, &genome2, &config),
    ///     DISJOINT_FACTOR * 2.0 + EXCESS_FACTOR * 1.0 + WEIGHT_FACTOR * (2.0 + 0.0) / 2.0
    /// );
    /// ```
    pub fn genetic_distance(first: &NNGenome, second: &NNGenome, config: &GeneticConfig) -> f32 {
        let (excess_first, disjoint_first) = first.count_unmatched_genes(second);
        let (excess_second, disjoint_second) = second.count_unmatched_genes(first);

        let weight_diffs: Vec<f32> = first
            .genes
            .iter()
            .filter_map(|(id, gene)| {
                second
                    .genes
                    .get(id)
                    .map(|other| (gene.weight() - other.weight()).abs())
            })
            .collect();
        let common_weight_diff = if weight_diffs.is_empty() {
            0.0
        } else {
            weight_diffs.iter().sum::<f32>() / weight_diffs.len() as f32
        };

        config.disjoint_gene_factor * (disjoint_first + disjoint_second) as f32
            + config.excess_gene_factor * (excess_first + excess_second) as f32
            + config.common_weight_factor * common_weight_diff
    }

    /// Counts own genes missing from `other`, as `(excess, disjoint)`.
    fn count_unmatched_genes(&self, other: &NNGenome) -> (usize, usize) {
        let other_max = other.genes.keys().next_back().copied();
        self.genes
            .keys()
            .filter(|id| !other.genes.contains_key(id))
            .fold((0, 0), |(excess, disjoint), &id| {
                if other_max.map_or(true, |max| id > max) {
                    (excess + 1, disjoint)
                } else {
                    (excess, disjoint + 1)
                }
            })
    }

    /// Returns an iterator over the genome's genes,
    /// in ascending innovation order.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    /// Returns an iterator over the genome's nodes,
    /// in ascending innovation order.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = NNGenome::new(0, &config);
    ///
    /// let ids: Vec<_> = genome.nodes().map(|n| n.innovation()).collect();
    /// assert_eq!(ids, [0, 1, 2, 3, 4]);
    /// ```
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn gene(&self, id: Innovation) -> Option<&Gene> {
        self.genes.get(&id)
    }

    pub fn node(&self, id: Innovation) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn id(&self) -> GenomeId {
        self.id
    }

    /// Sets the genome's fitness to the value passed.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let mut genome = NNGenome::new(0, &GeneticConfig::zero());
    /// assert_eq!(genome.fitness(), None);
    ///
    /// genome.set_fitness(32.0);
    /// assert_eq!(genome.fitness(), Some(32.0));
    /// ```
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    /// Returns the genome's fitness, or `None`
    /// if it has not been evaluated yet.
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}

impl Genome for NNGenome {
    type Config = GeneticConfig;
    type InnovationHistory = History;

    fn new<R: Rng + ?Sized>(id: GenomeId, config: &GeneticConfig, rng: &mut R) -> Self {
        Self::with_rng(id, config, rng)
    }

    fn check_config(config: &GeneticConfig) -> Result<(), ConfigurationError> {
        config.validate()
    }

    fn conforms_to(&self, config: &GeneticConfig) -> bool {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        let of_type = |id: Innovation, node_type: NodeType| {
            self.nodes
                .get(&id)
                .map_or(false, |n| n.node_type() == node_type)
        };
        let io_nodes = self
            .nodes
            .values()
            .filter(|n| n.node_type() != NodeType::Neuron)
            .count();

        io_nodes == input_count + output_count
            && (0..input_count).all(|i| of_type(i, NodeType::Sensor))
            && (input_count..input_count + output_count).all(|o| of_type(o, NodeType::Actuator))
    }

    fn id(&self) -> GenomeId {
        self.id
    }

    fn genetic_distance(first: &Self, second: &Self, config: &GeneticConfig) -> f32 {
        NNGenome::genetic_distance(first, second, config)
    }

    fn mate<R: Rng + ?Sized>(
        id: GenomeId,
        parent1: &Self,
        parent2: &Self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Self {
        let mut child = Self::crossover(id, parent1, parent2, config, rng);
        child.mutate(history, config, rng);
        child
    }

    fn clone_mutated<R: Rng + ?Sized>(
        id: GenomeId,
        parent: &Self,
        history: &mut History,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Self {
        let mut child = parent.clone();
        child.id = id;
        child.fitness = None;
        child.mutate(history, config, rng);
        child
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}

impl fmt::Display for NNGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genes: Vec<&Gene> = self.genes.values().collect();
        let nodes: Vec<&Node> = self.nodes.values().collect();
        f.debug_struct("NNGenome")
            .field("Id", &self.id)
            .field("Genes", &genes)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoneat::InnovationHistory;
    use rand::{rngs::StdRng, SeedableRng};
    use std::num::NonZeroUsize;

    fn io_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    fn assert_consistent(genome: &NNGenome) {
        let mut pairs = HashSet::new();
        for gene in genome.genes() {
            assert!(pairs.insert(gene.endpoints()), "duplicate endpoints in {}", genome);
            let input = genome.node(gene.input()).unwrap();
            let output = genome.node(gene.output()).unwrap();
            assert!(input.output_genes().any(|&id| id == gene.innovation()));
            assert!(output.input_genes().any(|&id| id == gene.innovation()));
            assert_ne!(output.node_type(), NodeType::Sensor);
        }
    }

    #[test]
    fn new_fully_connected() {
        let mut rng = StdRng::seed_from_u64(0);
        for input_count in 1..6 {
            for output_count in 1..6 {
                let config = GeneticConfig {
                    initial_expression_chance: 1.0,
                    output_activation_types: vec![
                        ActivationType::Sigmoid,
                        ActivationType::Gaussian,
                        ActivationType::Identity,
                    ],
                    ..io_config(input_count, output_count)
                };

                let genome = NNGenome::with_rng(0, &config, &mut rng);
                assert_eq!(genome.genes.len(), input_count * output_count);
                assert!(genome.conforms_to(&config));
                for node in genome.nodes().filter(|n| n.node_type() == NodeType::Actuator) {
                    let expected = config
                        .output_activation_types
                        .get(node.innovation() - input_count)
                        .copied()
                        .unwrap_or(ActivationType::Sigmoid);
                    assert_eq!(node.activation_type(), expected);
                }
                for g in genome.genes() {
                    assert_eq!(g.innovation(), g.input() * output_count + (g.output() - input_count));
                }
                assert_consistent(&genome);
            }
        }
    }

    #[test]
    fn new_unconnected() {
        let genome = NNGenome::new(3, &io_config(2, 2));
        assert_eq!(genome.genes.len(), 0);
        assert_eq!(genome.id(), 3);
        assert_eq!(genome.fitness(), None);
    }

    #[test]
    fn add_gene_rejections() {
        let mut genome = NNGenome::new(0, &io_config(2, 1));
        genome.add_gene(7, 0, 2, 1.0).unwrap();

        assert_eq!(
            genome.check_gene_viability(7, 1, 2),
            Err(StructureError::DuplicateGene(7, Some((1, 2))))
        );
        assert_eq!(
            genome.check_gene_viability(8, 0, 2),
            Err(StructureError::DuplicateEndpoints(8, (0, 2)))
        );
        assert_eq!(
            genome.check_gene_viability(8, 0, 9),
            Err(StructureError::MissingEndpoints(0, 9))
        );
        assert_eq!(
            genome.check_gene_viability(8, 2, 1),
            Err(StructureError::SensorOutput(1))
        );
        assert!(genome.add_gene(8, 2, 1, 1.0).is_err());
        assert_eq!(genome.genes().count(), 1);
    }

    #[test]
    fn mutate_weights_reset_and_bias() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            weight_bound: 3.0,
            weight_reset_chance: 1.0,
            ..io_config(2, 2)
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);
        genome.mutate_weights(&config, &mut rng);

        assert!(genome.genes().all(|g| g.weight().abs() <= 3.0));
        assert!(genome
            .nodes()
            .filter(|n| n.node_type() == NodeType::Sensor)
            .all(|n| n.bias() == 0.0));
        assert!(genome
            .nodes()
            .filter(|n| n.node_type() == NodeType::Actuator)
            .any(|n| n.bias() != 0.0));
    }

    #[test]
    fn mutate_weights_none() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            weight_bound: 3.0,
            ..io_config(2, 2)
        };
        let mut rng = StdRng::seed_from_u64(2);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);
        let before = genome.clone();
        genome.mutate_weights(&config, &mut rng);
        assert_eq!(genome, before);
    }

    #[test]
    fn toggle_expression_flips_one_gene() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            ..io_config(2, 1)
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);

        let toggled = genome.mutate_toggle_expression(&mut rng).unwrap();
        assert!(!genome.gene(toggled).unwrap().enabled());
        assert_eq!(genome.genes().filter(|g| g.enabled()).count(), 1);

        let mut empty = NNGenome::new(1, &io_config(2, 1));
        assert_eq!(empty.mutate_toggle_expression(&mut rng), None);
    }

    #[test]
    fn mutate_gene_addition() {
        let config = GeneticConfig {
            max_gene_addition_mutation_attempts: 3,
            weight_bound: 1.0,
            ..io_config(2, 1)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(3);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);

        let gene = genome
            .mutate_add_gene(&mut history, &config, &mut rng)
            .unwrap()
            .clone();
        // Sensors cannot recurse, and the actuator has no other target.
        assert_eq!(gene.output(), 2);
        assert!(gene.input() < 2);
        assert_eq!(gene.innovation(), gene.input());
        assert_consistent(&genome);
    }

    #[test]
    fn mutate_gene_addition_recursive() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            max_gene_addition_mutation_attempts: 1,
            recursion_chance: 1.0,
            ..io_config(1, 1)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(4);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);

        let gene = genome
            .mutate_add_gene(&mut history, &config, &mut rng)
            .unwrap()
            .clone();
        assert_eq!(gene.endpoints(), (1, 1));
        assert_eq!(gene.innovation(), 1);

        // Now every pair is connected.
        let error = genome
            .mutate_add_gene(&mut history, &config, &mut rng)
            .unwrap_err();
        assert_eq!(error.to_string(), "structural mutation failed: genome is fully connected");
    }

    #[test]
    fn mutate_gene_addition_no_attempts() {
        let config = io_config(2, 2);
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(0, &config);

        let error = genome
            .mutate_add_gene(&mut history, &config, &mut rand::thread_rng())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "structural mutation failed: no unlinked node pair found"
        );
        assert_eq!(genome.genes().count(), 0);
    }

    #[test]
    fn mutate_node_addition() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            weight_bound: 2.0,
            ..io_config(1, 1)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(6);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);
        let old_weight = genome.gene(0).unwrap().weight();

        let (input, node, output) = genome
            .mutate_add_node(&mut history, &config, &mut rng)
            .unwrap();
        assert_eq!((input.innovation(), node.innovation(), output.innovation()), (1, 2, 2));
        assert_eq!(input.endpoints(), (0, 2));
        assert_eq!(output.endpoints(), (2, 1));
        assert_eq!(input.weight(), 1.0);
        assert_eq!(output.weight(), old_weight);
        assert_eq!(node.activation_type(), ActivationType::Sigmoid);

        assert!(!genome.gene(0).unwrap().enabled());
        assert_eq!(genome.nodes().count(), 3);
        assert_consistent(&genome);

        // The only enabled genes left are the new ones.
        genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        assert_eq!(genome.genes().filter(|g| !g.enabled()).count(), 2);
        assert_consistent(&genome);
    }

    #[test]
    fn mutate_node_addition_without_enabled_genes() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            ..io_config(1, 1)
        };
        let mut history = History::new(&config);
        let mut genome = NNGenome::new(0, &config);
        genome.genes.get_mut(&0).unwrap().set_enabled(false);

        let error = genome
            .mutate_add_node(&mut history, &config, &mut rand::thread_rng())
            .unwrap_err();
        assert_eq!(error.to_string(), "structural mutation failed: genome has no enabled gene to split");
    }

    #[test]
    fn same_generation_mutations_share_innovations() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            ..io_config(1, 1)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(8);
        let parent = NNGenome::with_rng(0, &config, &mut rng);

        let mut first = parent.clone();
        let mut second = parent.clone();
        first.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        second.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        let ids = |g: &NNGenome| g.genes().map(Gene::innovation).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.node(2).map(Node::node_type), Some(NodeType::Neuron));
        assert!(second.node(2).is_some());

        history.start_generation();
        let mut third = parent.clone();
        third.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        assert!(third.node(2).is_none());
        assert_eq!(ids(&third), [0, 3, 4]);
    }

    #[test]
    fn crossover_never_duplicates_innovations() {
        let config = GeneticConfig {
            initial_expression_chance: 0.7,
            weight_bound: 2.0,
            weight_mutation_chance: 0.5,
            weight_nudge_chance: 0.9,
            weight_mutation_power: 0.5,
            toggle_expression_chance: 0.1,
            node_addition_mutation_chance: 0.3,
            gene_addition_mutation_chance: 0.5,
            max_gene_addition_mutation_attempts: 10,
            recursion_chance: 0.1,
            mate_by_averaging_chance: 0.3,
            reenable_chance: 0.25,
            noncommon_inheritance_chance: 0.5,
            ..io_config(3, 2)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(9);
        let mut genomes: Vec<NNGenome> = (0..20)
            .map(|id| NNGenome::with_rng(id, &config, &mut rng))
            .collect();

        let mut next_id = genomes.len();
        for _ in 0..15 {
            history.start_generation();
            let mut children = Vec::with_capacity(genomes.len());
            for _ in 0..genomes.len() {
                let parent1 = genomes.choose(&mut rng).unwrap();
                let parent2 = genomes.choose(&mut rng).unwrap();
                let mut child = NNGenome::mate(next_id, parent1, parent2, &mut history, &config, &mut rng);
                child.set_fitness(rng.gen_range(0.0..4.0));
                next_id += 1;

                let unique: HashSet<_> = child.genes().map(Gene::innovation).collect();
                assert_eq!(unique.len(), child.genes().count());
                assert_consistent(&child);
                assert!(child.conforms_to(&config));
                children.push(child);
            }
            genomes = children;
        }
    }

    #[test]
    fn crossover_prefers_fitter_structure() {
        let config = GeneticConfig {
            noncommon_inheritance_chance: 1.0,
            ..io_config(2, 1)
        };
        let mut fitter = NNGenome::new(0, &config);
        fitter.add_gene(0, 0, 2, 1.0).unwrap();
        fitter.add_node(3, ActivationType::ReLU).unwrap();
        fitter.add_gene(5, 1, 3, 0.5).unwrap();
        fitter.add_gene(6, 3, 2, 0.5).unwrap();
        fitter.set_fitness(3.0);

        let mut weaker = NNGenome::new(1, &config);
        weaker.add_gene(0, 0, 2, -1.0).unwrap();
        weaker.add_gene(1, 1, 2, 2.0).unwrap();
        weaker.set_fitness(1.0);

        let child = NNGenome::crossover(2, &weaker, &fitter, &config, &mut rand::thread_rng());
        let ids: Vec<_> = child.genes().map(Gene::innovation).collect();
        assert_eq!(ids, [0, 5, 6]);
        assert!([1.0, -1.0].contains(&child.gene(0).unwrap().weight()));
        assert_eq!(child.node(3).map(Node::activation_type), Some(ActivationType::ReLU));
        assert_consistent(&child);
    }

    #[test]
    fn crossover_with_equal_fitness_skips_shadowed_endpoints() {
        let config = GeneticConfig {
            noncommon_inheritance_chance: 1.0,
            mate_by_averaging_chance: 1.0,
            ..io_config(1, 1)
        };
        let mut parent1 = NNGenome::new(0, &config);
        parent1.add_gene(0, 0, 1, 1.0).unwrap();
        parent1.add_gene(4, 1, 1, 1.0).unwrap();
        parent1.set_fitness(1.0);

        let mut parent2 = NNGenome::new(1, &config);
        parent2.add_gene(0, 0, 1, 3.0).unwrap();
        parent2.add_gene(9, 1, 1, 1.0).unwrap();
        parent2.set_fitness(1.0);

        let child = NNGenome::crossover(2, &parent1, &parent2, &config, &mut rand::thread_rng());
        let ids: Vec<_> = child.genes().map(Gene::innovation).collect();
        assert_eq!(ids, [0, 4]);
        assert_eq!(child.gene(0).unwrap().weight(), 2.0);
    }

    #[test]
    fn crossover_keeps_disabled_genes_without_reenabling() {
        let config = io_config(1, 1);
        let mut parent1 = NNGenome::new(0, &config);
        parent1.add_gene(0, 0, 1, 1.0).unwrap().set_enabled(false);
        let mut parent2 = NNGenome::new(1, &config);
        parent2.add_gene(0, 0, 1, 1.0).unwrap();

        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..20 {
            let child = NNGenome::crossover(2, &parent1, &parent2, &config, &mut rng);
            assert!(!child.gene(0).unwrap().enabled());
        }

        let config = GeneticConfig {
            reenable_chance: 1.0,
            ..config
        };
        let child = NNGenome::crossover(2, &parent1, &parent2, &config, &mut rng);
        assert!(child.gene(0).unwrap().enabled());
    }

    #[test]
    fn genetic_distance_properties() {
        let config = GeneticConfig {
            initial_expression_chance: 0.5,
            weight_bound: 3.0,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            ..io_config(4, 3)
        };
        let mut rng = StdRng::seed_from_u64(12);
        for id in 0..20 {
            let first = NNGenome::with_rng(id, &config, &mut rng);
            let second = NNGenome::with_rng(id + 1, &config, &mut rng);
            assert_eq!(NNGenome::genetic_distance(&first, &first.clone(), &config), 0.0);
            assert_eq!(
                NNGenome::genetic_distance(&first, &second, &config),
                NNGenome::genetic_distance(&second, &first, &config)
            );
        }

        let empty = NNGenome::new(0, &config);
        let mut single = NNGenome::new(1, &config);
        single.add_gene(2, 0, 6, 1.0).unwrap();
        assert_eq!(NNGenome::genetic_distance(&empty, &single, &config), 1.0);
    }

    #[test]
    fn clone_mutated_is_a_new_unevaluated_genome() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            ..io_config(2, 1)
        };
        let mut history = History::new(&config);
        let mut parent = NNGenome::new(0, &config);
        parent.set_fitness(1.5);

        let child = NNGenome::clone_mutated(8, &parent, &mut history, &config, &mut rand::thread_rng());
        assert_eq!(Genome::id(&child), 8);
        assert_eq!(Genome::fitness(&child), None);
        assert_eq!(child.genes, parent.genes);
    }

    #[test]
    fn rejects_foreign_io_layout() {
        let genome = NNGenome::new(0, &io_config(2, 1));
        assert!(genome.conforms_to(&io_config(2, 1)));
        assert!(!genome.conforms_to(&io_config(1, 2)));
        assert!(!genome.conforms_to(&io_config(3, 1)));
    }

    #[test]
    fn serde_round_trip() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            weight_bound: 2.0,
            ..io_config(3, 2)
        };
        let mut history = History::new(&config);
        let mut rng = StdRng::seed_from_u64(13);
        let mut genome = NNGenome::with_rng(0, &config, &mut rng);
        genome.mutate_add_node(&mut history, &config, &mut rng).unwrap();
        genome.set_fitness(2.5);

        let serialized = serde_json::to_string(&genome).unwrap();
        let reloaded: NNGenome = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reloaded, genome);
        assert_eq!(reloaded.to_string(), genome.to_string());
    }
}
