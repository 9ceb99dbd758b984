use crate::genomics::NNGenome;
use crate::networks::RealTimeNetwork;

/// A network answering one input point at a time.
///
/// Each evaluation starts from rest and activates the
/// network once per link on the longest input-to-output
/// path, so every input has reached every output it can.
///
/// # Generic parameters
/// `MAX_NODE_VISITS` bounds how many times a path may pass
/// through the same node while measuring that length. 0
/// disables the network, 1 ignores cycles, 2 allows one
/// pass around each cycle, and so on.
#[derive(Clone, Debug)]
pub struct FunctionApproximatorNetwork<const MAX_NODE_VISITS: u8> {
    network: RealTimeNetwork,
    depth: usize,
}

/// A node on the current search path.
struct Step {
    node: usize,
    depth: usize,
    next_link: usize,
    deepest: usize,
}

impl Step {
    fn new(node: usize, depth: usize) -> Step {
        Step {
            node,
            depth,
            next_link: 0,
            deepest: 0,
        }
    }
}

impl<const MAX_NODE_VISITS: u8> From<&NNGenome> for FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Builds the network expressed by `genome`.
    ///
    /// # Complexity
    /// Measuring the depth enumerates paths, taking
    /// `O(d^(n × MAX_NODE_VISITS))` time, where `d` is the
    /// largest out-degree and `n` the node count.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{GeneticConfig, NNGenome};
    /// use evoneat_nn::networks::FunctionApproximatorNetwork;
    ///
    /// let genome = NNGenome::new(0, &GeneticConfig::zero());
    /// let network = FunctionApproximatorNetwork::<1>::from(&genome);
    /// assert_eq!(network.depth(), 0);
    /// ```
    fn from(genome: &NNGenome) -> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
        let network = RealTimeNetwork::from(genome);
        let depth = (0..network.input_count())
            .map(|root| Self::deepest_output(&network, root))
            .max()
            .unwrap_or(0);

        FunctionApproximatorNetwork { network, depth }
    }
}

impl<const MAX_NODE_VISITS: u8> FunctionApproximatorNetwork<MAX_NODE_VISITS> {
    /// Length of the longest path from `root` that ends on an
    /// output node it cannot extend, with no node entered more
    /// than `MAX_NODE_VISITS` times.
    fn deepest_output(network: &RealTimeNetwork, root: usize) -> usize {
        let mut visits = vec![0u8; network.node_count()];
        let mut path = vec![Step::new(root, 0)];
        let mut deepest = 0;

        while let Some(step) = path.last_mut() {
            match network.links_from(step.node).get(step.next_link) {
                Some(link) => {
                    step.next_link += 1;
                    if visits[link.target] < MAX_NODE_VISITS {
                        visits[link.target] += 1;
                        let next = Step::new(link.target, step.depth + 1);
                        path.push(next);
                    }
                }
                None => {
                    let reached = if step.deepest == 0 && network.is_output(step.node) {
                        step.depth
                    } else {
                        step.deepest
                    };
                    let node = step.node;
                    path.pop();
                    match path.last_mut() {
                        Some(parent) => {
                            visits[node] -= 1;
                            parent.deepest = parent.deepest.max(reached);
                        }
                        None => deepest = reached,
                    }
                }
            }
        }
        deepest
    }

    /// Number of activations run per evaluation.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the approximated function's value
    /// at the point given by `inputs`.
    ///
    /// # Examples
    /// ```
    /// use evoneat_nn::genomics::{ActivationType, GeneticConfig, NNGenome};
    /// use evoneat_nn::networks::FunctionApproximatorNetwork;
    ///
    /// let sigmoid = |x| ActivationType::Sigmoid.apply(x);
    ///
    /// // An input, a hidden node, and an output in a chain.
    /// let mut genome = NNGenome::new(0, &GeneticConfig::zero());
    /// genome.add_node(2, ActivationType::Sigmoid).unwrap();
    /// genome.add_gene(0, 0, 2, 1.0).unwrap();
    /// genome.add_gene(1, 2, 1, 1.0).unwrap();
    /// let mut network = FunctionApproximatorNetwork::<1>::from(&genome);
    ///
    /// for input in -20..=20 {
    ///     let input = input as f32 / 10.0;
    ///     assert_eq!(network.evaluate_at(&[input])[0], sigmoid(sigmoid(input)));
    /// }
    /// ```
    pub fn evaluate_at(&mut self, inputs: &[f32]) -> Vec<f32> {
        self.network.clear_state();
        self.network.set_inputs(inputs);
        (0..self.depth).for_each(|_| self.network.activate());
        self.network.outputs()
    }
}
