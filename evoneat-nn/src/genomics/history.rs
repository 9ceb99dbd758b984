use crate::genomics::GeneticConfig;
use crate::Innovation;

use ahash::RandomState;
use evoneat::InnovationHistory;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// Innovation numbers assigned by a node mutation,
/// as `(input gene, new node, output gene)`.
pub type NodeInnovation = (Innovation, Innovation, Innovation);

/// A `History` hands out gene and node innovation numbers
/// for a population, making sure identical structural
/// mutations in the same generation share their numbers.
///
/// For gene innovations the input and output nodes are used to
/// identify identical mutations. For node innovations the split
/// gene is used, and the innovation numbers for the corresponding
/// input gene, new node, and output gene are recorded.
///
/// Records are dropped at the start of every generation,
/// while the counters keep growing, so numbers are never reused.
/// The genes between sensors and actuators are the exception:
/// they always carry their canonical number `o + i ⨯ output_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    input_count: usize,
    output_count: usize,
    next_gene_innovation: Innovation,
    next_node_innovation: Innovation,
    gene_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    node_innovations: HashMap<Innovation, NodeInnovation, RandomState>,
}

impl InnovationHistory for History {
    type Config = GeneticConfig;

    fn new(config: &GeneticConfig) -> History {
        Self::new(config)
    }

    fn start_generation(&mut self) {
        self.gene_innovations.clear();
        self.node_innovations.clear();
    }
}

impl History {
    /// Creates a new History using the specified configuration.
    ///
    /// Innovation numbers for all possible initial genes and for
    /// the sensor and actuator nodes are reserved, so the first
    /// mutation gene number is `input_count ⨯ output_count` and
    /// the first hidden node number is `input_count + output_count`.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, History};
    /// use std::num::NonZeroUsize;
    ///
    /// let history = History::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert_eq!(history.next_gene_innovation(), 6);
    /// assert_eq!(history.next_node_innovation(), 5);
    /// ```
    pub fn new(config: &GeneticConfig) -> History {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        History {
            input_count,
            output_count,
            next_gene_innovation: input_count * output_count,
            next_node_innovation: input_count + output_count,
            gene_innovations: HashMap::default(),
            node_innovations: HashMap::default(),
        }
    }

    /// Returns the canonical innovation number of a
    /// sensor to actuator gene, if the endpoints are such.
    pub(crate) fn initial_gene_innovation(
        &self,
        input_id: Innovation,
        output_id: Innovation,
    ) -> Option<Innovation> {
        let actuators = self.input_count..self.input_count + self.output_count;
        if input_id < self.input_count && actuators.contains(&output_id) {
            Some((output_id - self.input_count) + input_id * self.output_count)
        } else {
            None
        }
    }

    /// Returns the innovation number for a gene between the
    /// given nodes, recording it if it is new this generation.
    pub(crate) fn gene_innovation(&mut self, input_id: Innovation, output_id: Innovation) -> Innovation {
        if let Some(id) = self.initial_gene_innovation(input_id, output_id) {
            return id;
        }
        match self.gene_innovations.entry((input_id, output_id)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_gene_innovation;
                self.next_gene_innovation += 1;
                *entry.insert(id)
            }
        }
    }

    /// Returns the numbers assigned to a split of
    /// `split_gene` earlier in this generation.
    pub(crate) fn recorded_node_innovation(&self, split_gene: Innovation) -> Option<NodeInnovation> {
        self.node_innovations.get(&split_gene).copied()
    }

    /// Allocates fresh numbers for a split of the gene
    /// `split_gene` between `endpoints`. The numbers are
    /// recorded unless a split of the same gene already was.
    pub(crate) fn add_node_innovation(
        &mut self,
        split_gene: Innovation,
        endpoints: (Innovation, Innovation),
    ) -> NodeInnovation {
        let (input_node, output_node) = endpoints;
        let new_node = self.next_node_innovation;
        self.next_node_innovation += 1;

        let input_gene = self.gene_innovation(input_node, new_node);
        let output_gene = self.gene_innovation(new_node, output_node);
        let record = (input_gene, new_node, output_gene);

        self.node_innovations.entry(split_gene).or_insert(record);
        record
    }

    /// Returns the gene innovation number the next
    /// new mutation will receive.
    pub fn next_gene_innovation(&self) -> Innovation {
        self.next_gene_innovation
    }

    /// Returns the node innovation number the next
    /// new mutation will receive.
    pub fn next_node_innovation(&self) -> Innovation {
        self.next_node_innovation
    }

    /// Returns an iterator over this generation's record of
    /// gene innovations, in the format
    /// `((input node, output node), gene innovation)`.
    /// No ordering is guaranteed.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, History, NNGenome};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     max_gene_addition_mutation_attempts: 1,
    ///     recursion_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut history = History::new(&config);
    /// let mut rng = rand::thread_rng();
    ///
    /// // Add mutations to the history through genome mutation.
    /// NNGenome::new(0, &config)
    ///     .mutate_add_gene(&mut history, &config, &mut rng)
    ///     .unwrap();
    ///
    /// for ((input_node, output_node), gene) in history.gene_innovation_history() {
    ///     println!("gene innovation with id {} from node {} to node {}",
    ///         gene, input_node, output_node);
    /// }
    /// assert_eq!(history.gene_innovation_history().count(), 1);
    /// ```
    pub fn gene_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.gene_innovations.iter()
    }

    /// Returns an iterator over this generation's record of
    /// node innovations, in the format
    /// `(split gene, (input gene, new node, output gene))`.
    /// No ordering is guaranteed.
    pub fn node_innovation_history(&self) -> impl Iterator<Item = (&Innovation, &NodeInnovation)> {
        self.node_innovations.iter()
    }
}
